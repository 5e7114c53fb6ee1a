//! Figures with fixed-size axes, drawn by [Matplotlib][].
//!
//! Every [`Figure`] remembers the [`Style`] it was created with.
//! Matplotlib reads its `rcParams` when artists are created and when
//! figures are drawn, so the methods below run inside an
//! `rc_context` holding that style instead of changing the global
//! defaults.  Use [`use_style`] to change these explicitly.
//!
//! [Matplotlib]: https://matplotlib.org/

use std::{
    ops::Index,
    path::{Path, PathBuf},
    sync::Arc,
};
use lazy_static::lazy_static;
use ndarray::Array2;
use numpy::{PyArray1, PyArray2};
use pyo3::{
    prelude::*,
    exceptions::{PyFileNotFoundError, PyPermissionError, PyValueError},
    types::{PyDict, PyModule, PyTuple},
};
use crate::{
    Error,
    divider::{self, PlacementError, RenderedBounds, SiblingRect,
              SiblingRequest},
    layout::{self, CellGrid, GridSpec},
    style::{Param, Style},
};

/// Import and return a handle to the module `$m`.
macro_rules! pyimport { ($m: literal) => {
    Python::with_gil(|py|
        PyModule::import_bound(py, $m).map(Bound::unbind))
}}

lazy_static! {
    static ref MATPLOTLIB: Result<Py<PyModule>, PyErr> = {
        pyimport!("matplotlib")
    };
    static ref PYPLOT: Result<Py<PyModule>, PyErr> = {
        pyimport!("matplotlib.pyplot")
    };
    static ref TRANSFORMS: Result<Py<PyModule>, PyErr> = {
        pyimport!("matplotlib.transforms")
    };
    static ref AXES_GRID: Result<Py<PyModule>, PyErr> = {
        pyimport!("mpl_toolkits.axes_grid1")
    };
    static ref AXES_SIZE: Result<Py<PyModule>, PyErr> = {
        pyimport!("mpl_toolkits.axes_grid1.axes_size")
    };
}

/// Return a handle to the module `$m`.
/// ⚠ This may try to lock Python's GIL.  Make sure it is executed
/// outside a call to `Python::with_gil`.
macro_rules! pymod { ($m: ident) => {
    $m.as_ref().map_err(|_| Error::NoMatplotlib)
}}

impl ToPyObject for Param {
    fn to_object(&self, py: Python<'_>) -> PyObject {
        match self {
            Param::Bool(b) => b.to_object(py),
            Param::Int(i) => i.to_object(py),
            Param::Float(x) => x.to_object(py),
            Param::Text(s) => s.to_object(py),
        }
    }
}

fn rc_dict<'py>(py: Python<'py>, style: &Style)
                -> PyResult<Bound<'py, PyDict>> {
    let rc = PyDict::new_bound(py);
    for (key, value) in style.iter() {
        rc.set_item(key, value)?;
    }
    Ok(rc)
}

/// Run `f` with `style` installed by `matplotlib.rc_context`.
fn styled<R>(py: Python<'_>, matplotlib: &Py<PyModule>, style: &Style,
             f: impl FnOnce() -> PyResult<R>) -> PyResult<R> {
    let ctx = matplotlib.bind(py)
        .call_method1("rc_context", (rc_dict(py, style)?,))?;
    ctx.call_method0("__enter__")?;
    let out = f();
    let exit = ctx.call_method1("__exit__", (py.None(), py.None(), py.None()));
    let out = out?;
    exit?;
    Ok(out)
}

/// Install `style` in Matplotlib's global `rcParams`.  Figures made
/// by [`fixed_size_subplots`] do not need this.
pub fn use_style(style: &Style) -> Result<(), Error> {
    let matplotlib = pymod!(MATPLOTLIB)?;
    Python::with_gil(|py| {
        let rc = rc_dict(py, style)?;
        matplotlib.bind(py).getattr("rcParams")?
            .call_method1("update", (rc,))?;
        Ok(())
    })
}

/// Current bounds of `ax`, with its aspect applied.
fn position(ax: &Bound<'_, PyAny>) -> PyResult<RenderedBounds> {
    let b: (f64, f64, f64, f64) = ax.call_method0("get_position")?
        .getattr("bounds")?.extract()?;
    Ok(b.into())
}

/// Bounds of `reference` as the renderer will draw it: given by its
/// own locator if it has one.
fn rendered_bounds(reference: &Bound<'_, PyAny>, renderer: &Bound<'_, PyAny>)
                   -> PyResult<RenderedBounds> {
    let locator = reference.call_method0("get_axes_locator")?;
    if locator.is_none() {
        return position(reference)
    }
    let b: (f64, f64, f64, f64) = locator
        .call1((reference.clone(), renderer.clone()))?
        .getattr("bounds")?.extract()?;
    Ok(b.into())
}

fn figure_width(ax: &Bound<'_, PyAny>) -> PyResult<f64> {
    ax.getattr("figure")?.call_method0("get_figwidth")?.extract()
}

/// `axes_locator` of an axes placed to the right of `reference`.
/// Matplotlib calls it with the renderer each time the figure is
/// drawn.
#[pyclass]
struct RightLocator {
    request: SiblingRequest,
    reference: PyObject,
}

#[pymethods]
impl RightLocator {
    fn __call__(&self, py: Python<'_>, _axes: &Bound<'_, PyAny>,
                renderer: &Bound<'_, PyAny>) -> PyResult<PyObject> {
        let reference = self.reference.bind(py);
        let rect = self.request
            .resolve(figure_width(reference)?,
                     || rendered_bounds(reference, renderer))
            .map_err(|e| match e {
                PlacementError::Geometry(e) =>
                    PyValueError::new_err(e.to_string()),
                PlacementError::ResolverUnavailable(e) => e,
            })?;
        tracing::debug!(x = rect.x, y = rect.y, width = rect.width,
                        height = rect.height, "located sibling axes");
        let transforms = TRANSFORMS.as_ref().map_err(|e| e.clone_ref(py))?;
        let bbox = transforms.bind(py).getattr("Bbox")?
            .call_method1("from_bounds",
                          (rect.x, rect.y, rect.width, rect.height))?;
        Ok(bbox.unbind())
    }

    /// The sibling does not belong to a grid spec.
    fn get_subplotspec(&self) -> Option<PyObject> { None }
}


/// Trait expressing that `Self` can be converted to a numpy.ndarray.
pub trait Data {
    fn to_numpy<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>>;
}

impl<T> Data for T where T: AsRef<[f64]> + ?Sized {
    fn to_numpy<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        PyArray1::from_slice_bound(py, self.as_ref())
    }
}

/// The top level container for all the plot elements.
#[derive(Debug, Clone)]
pub struct Figure {
    fig: PyObject, // instance of matplotlib.figure.Figure
    style: Arc<Style>,
}

/// An axes of a [`Figure`].
#[derive(Debug, Clone)]
pub struct Axes {
    ax: PyObject,
    style: Arc<Style>,
}

/// Image drawn by [`Axes::imshow`].
#[derive(Debug, Clone)]
pub struct Image {
    im: PyObject,
}

#[derive(Debug, Clone)]
pub struct Colorbar {
    cb: PyObject,
    style: Arc<Style>,
}

/// Axes of a fixed-size grid, indexed by `(row, col)` with row 0 at
/// the bottom of the figure.
#[derive(Debug, Clone)]
pub struct AxesGrid {
    axes: Vec<Axes>, // row-major
    cells: CellGrid,
}

#[inline(always)]
fn grid<const R: usize, const C: usize, U>(
    f: impl Fn(usize, usize) -> U) -> [[U; C]; R] {
    let mut r = 0;
    [(); R].map(|_| {
        let mut c = 0;
        let row = [(); C].map(|_| {
            let y = f(r, c);
            c += 1;
            y });
        r += 1;
        row })
}

/// Create a figure whose axes have the fixed sizes given by `spec`.
/// The figure size is computed from `spec` and every cell gets an
/// axes at its [`CellRect`](crate::CellRect).  Artists of the figure
/// use `style`.
///
/// Return an error if `spec` is malformed or if Matplotlib is not
/// present on the system.
pub fn fixed_size_subplots(spec: &GridSpec, style: &Style)
                           -> Result<(Figure, AxesGrid), Error> {
    let cells = layout::compute_grid(spec)?;
    let matplotlib = pymod!(MATPLOTLIB)?;
    let pyplot = pymod!(PYPLOT)?;
    let style = Arc::new(style.clone());
    Python::with_gil(|py| {
        let size = cells.geometry();
        let (fig, axes) = styled(py, matplotlib, &style, || {
            let kwargs = PyDict::new_bound(py);
            kwargs.set_item("figsize", (size.width, size.height))?;
            let fig = pyplot.bind(py).call_method("figure", (), Some(&kwargs))?;
            let mut axes = Vec::with_capacity(cells.rows() * cells.cols());
            for (_, cell) in cells.iter() {
                let ax = fig.call_method1("add_axes",
                                          (cell.bounds().to_vec(),))?;
                axes.push(ax.unbind());
            }
            Ok((fig.unbind(), axes))
        })?;
        tracing::debug!(rows = cells.rows(), cols = cells.cols(),
                        width = size.width, height = size.height,
                        "created fixed-size figure");
        let axes = axes.into_iter()
            .map(|ax| Axes { ax, style: Arc::clone(&style) })
            .collect();
        Ok((Figure { fig, style }, AxesGrid { axes, cells }))
    })
}

impl AxesGrid {
    pub fn rows(&self) -> usize { self.cells.rows() }

    pub fn cols(&self) -> usize { self.cells.cols() }

    /// The layout the axes were placed with.
    pub fn cells(&self) -> &CellGrid { &self.cells }

    pub fn get(&self, row: usize, col: usize) -> Option<&Axes> {
        if row < self.rows() && col < self.cols() {
            self.axes.get(row * self.cols() + col)
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut Axes> {
        let cols = self.cols();
        if row < self.rows() && col < cols {
            self.axes.get_mut(row * cols + col)
        } else {
            None
        }
    }

    /// Iterate over `((row, col), axes)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &Axes)> {
        let cols = self.cols();
        self.axes.iter().enumerate().map(move |(i, ax)| ((i / cols, i % cols), ax))
    }

    /// Convert to an `R` × `C` array (row 0 at the bottom), or `None`
    /// if the grid has another shape.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use plothelper::{fixed_size_subplots, GridSpec, Style};
    /// let (fig, axs) = fixed_size_subplots(&GridSpec::new(1, 2),
    ///                                      &Style::default())?;
    /// let [[mut left, mut right]] = axs.into_array().unwrap();
    /// left.set_title("left")?;
    /// right.set_title("right")?;
    /// # Ok::<(), plothelper::Error>(())
    /// ```
    pub fn into_array<const R: usize, const C: usize>(self)
                                                      -> Option<[[Axes; C]; R]> {
        if R != self.rows() || C != self.cols() {
            return None
        }
        Some(grid(|r, c| self.axes[r * C + c].clone()))
    }
}

impl Index<(usize, usize)> for AxesGrid {
    type Output = Axes;

    fn index(&self, (row, col): (usize, usize)) -> &Axes {
        match self.get(row, col) {
            Some(ax) => ax,
            None => panic!("plothelper::AxesGrid: no axes at ({}, {}) in a \
                            {} × {} grid", row, col, self.rows(), self.cols()),
        }
    }
}

/// Output formats of [`Figure::save_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Png,
    Svg,
    Pdf,
}

impl Format {
    /// Raster and vector formats, as usually exported for a paper.
    pub const ALL: [Format; 3] = [Format::Png, Format::Svg, Format::Pdf];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Png => "png",
            Format::Svg => "svg",
            Format::Pdf => "pdf",
        }
    }
}

impl Figure {
    /// Size of the figure in inches.
    pub fn size(&self) -> Result<(f64, f64), Error> {
        Python::with_gil(|py| {
            let fig = self.fig.bind(py);
            let w: f64 = fig.call_method0("get_figwidth")?.extract()?;
            let h: f64 = fig.call_method0("get_figheight")?.extract()?;
            Ok((w, h))
        })
    }

    pub fn style(&self) -> &Style { &self.style }

    /// Draw the figure without output, resolving the position of
    /// every located axes.
    pub fn draw(&self) -> Result<(), Error> {
        let matplotlib = pymod!(MATPLOTLIB)?;
        Python::with_gil(|py| {
            styled(py, matplotlib, &self.style, || {
                self.fig.bind(py).call_method0("draw_without_rendering")
            })?;
            Ok(())
        })
    }

    /// Return the renderer of the figure's canvas.
    pub fn renderer(&self) -> Result<PyObject, Error> {
        let matplotlib = pymod!(MATPLOTLIB)?;
        Python::with_gil(|py| {
            let fig = self.fig.bind(py);
            let canvas = fig.getattr("canvas")?;
            if canvas.hasattr("get_renderer")? {
                return Ok(canvas.call_method0("get_renderer")?.unbind())
            }
            if fig.hasattr("_get_renderer")? {
                return Ok(fig.call_method0("_get_renderer")?.unbind())
            }
            let backend: String = matplotlib.bind(py)
                .call_method0("get_backend")?.extract()?;
            Err(Error::NoRenderer(backend))
        })
    }

    pub fn save(&self) -> Savefig {
        Savefig { fig: self.fig.clone(), style: Arc::clone(&self.style),
                  dpi: None, format: None }
    }

    /// Save the figure to `basename.<ext>` once for each of `formats`
    /// and return the paths written.
    pub fn save_all(&self, basename: impl AsRef<Path>, formats: &[Format])
                    -> Result<Vec<PathBuf>, Error> {
        let mut paths = Vec::with_capacity(formats.len());
        for &format in formats {
            let mut name = basename.as_ref().as_os_str().to_owned();
            name.push(".");
            name.push(format.extension());
            let path = PathBuf::from(name);
            self.save().format(format).to_file(&path)?;
            paths.push(path);
        }
        Ok(paths)
    }
}

pub struct Savefig {
    fig: PyObject,
    style: Arc<Style>,
    dpi: Option<f64>,
    format: Option<Format>,
}

impl Savefig {
    pub fn dpi(&mut self, dpi: f64) -> &mut Self {
        if dpi > 0. {
            self.dpi = Some(dpi);
        } else {
            self.dpi = None;
        }
        self
    }

    /// Force the output format instead of deducing it from the file
    /// extension.
    pub fn format(&mut self, format: Format) -> &mut Self {
        self.format = Some(format);
        self
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let matplotlib = pymod!(MATPLOTLIB)?;
        let path = path.as_ref();
        Python::with_gil(|py| {
            styled(py, matplotlib, &self.style, || {
                let kwargs = PyDict::new_bound(py);
                if let Some(dpi) = self.dpi {
                    kwargs.set_item("dpi", dpi)?
                }
                if let Some(format) = self.format {
                    kwargs.set_item("format", format.extension())?
                }
                self.fig.bind(py).call_method("savefig", (path,), Some(&kwargs))
                    .map(|_| ())
            }).map_err(|e| {
                if e.is_instance_of::<PyFileNotFoundError>(py) {
                    Error::FileNotFoundError
                } else if e.is_instance_of::<PyPermissionError>(py) {
                    Error::PermissionError
                } else {
                    Error::Python(e)
                }
            })
        })?;
        tracing::debug!("saved figure to {}", path.display());
        Ok(())
    }
}


impl Axes {
    /// Call the method `name` of the underlying Python axes inside
    /// the figure's style.
    fn call<A>(&self, name: &str, args: A) -> Result<PyObject, Error>
    where A: IntoPy<Py<PyTuple>> {
        let matplotlib = pymod!(MATPLOTLIB)?;
        Python::with_gil(|py| {
            let r = styled(py, matplotlib, &self.style, || {
                self.ax.bind(py).call_method1(name, args)
            })?;
            Ok(r.unbind())
        })
    }

    /// The figure holding this axes.
    pub fn figure(&self) -> Result<Figure, Error> {
        Python::with_gil(|py| {
            let fig = self.ax.bind(py).getattr("figure")?;
            Ok(Figure { fig: fig.unbind(), style: Arc::clone(&self.style) })
        })
    }

    /// Plot `y` versus `x` as lines and/or markers.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use plothelper::{fixed_size_subplots, GridSpec, Style};
    /// let (fig, mut axs) = fixed_size_subplots(&GridSpec::default(),
    ///                                          &Style::default())?;
    /// let ax = axs.get_mut(0, 0).unwrap();
    /// ax.xy(&[1., 2., 3., 4.], &[1., 4., 2., 3.]).fmt("r.").plot()?;
    /// fig.save().to_file("target/XY_plot.pdf")?;
    /// # Ok::<(), plothelper::Error>(())
    /// ```
    #[must_use]
    pub fn xy<'a, D>(&'a mut self, x: &'a D, y: &'a D) -> XY<'a, D>
    where D: Data + ?Sized {
        XY { axes: self, x, y, fmt: "", label: "", linewidth: None }
    }

    /// Display `data` as an image with the colormap `cmap`.
    pub fn imshow(&mut self, data: &Array2<f64>, cmap: &str)
                  -> Result<Image, Error> {
        let matplotlib = pymod!(MATPLOTLIB)?;
        Python::with_gil(|py| {
            let im = styled(py, matplotlib, &self.style, || {
                let kwargs = PyDict::new_bound(py);
                kwargs.set_item("cmap", cmap)?;
                let data = PyArray2::from_array_bound(py, data);
                self.ax.bind(py).call_method("imshow", (data,), Some(&kwargs))
            })?;
            Ok(Image { im: im.unbind() })
        })
    }

    pub fn set_title(&mut self, v: &str) -> Result<&mut Self, Error> {
        self.call("set_title", (v,))?;
        Ok(self)
    }

    pub fn set_xlabel(&mut self, label: &str) -> Result<&mut Self, Error> {
        self.call("set_xlabel", (label,))?;
        Ok(self)
    }

    pub fn set_ylabel(&mut self, label: &str) -> Result<&mut Self, Error> {
        self.call("set_ylabel", (label,))?;
        Ok(self)
    }

    pub fn minorticks_on(&mut self) -> Result<&mut Self, Error> {
        self.call("minorticks_on", ())?;
        Ok(self)
    }

    /// Current position of the axes in figure fractions.
    pub fn position(&self) -> Result<RenderedBounds, Error> {
        Python::with_gil(|py| Ok(position(self.ax.bind(py))?))
    }

    /// Ratio of the display aspect to the data aspect.  It is 1 when
    /// a data unit has the same length along both axes.
    pub fn aspect(&self) -> Result<f64, Error> {
        Python::with_gil(|py| {
            let ax = self.ax.bind(py);
            let fig = ax.getattr("figure")?;
            let w: f64 = fig.call_method0("get_figwidth")?.extract()?;
            let h: f64 = fig.call_method0("get_figheight")?.extract()?;
            let b = position(ax)?;
            let xlim: (f64, f64) = ax.call_method0("get_xlim")?.extract()?;
            let ylim: (f64, f64) = ax.call_method0("get_ylim")?.extract()?;
            Ok(divider::display_aspect((w, h), (b.width, b.height),
                                       xlim, ylim))
        })
    }

    /// Place a rectangle to the right of this axes now, using the
    /// canvas renderer, rather than at draw time as
    /// [`Axes::colorbar`] does.
    pub fn sibling_now(&self, pad: f64, aspect: f64)
                       -> Result<SiblingRect, Error> {
        let request = SiblingRequest::new(pad, aspect)?;
        let renderer = self.figure()?.renderer()?;
        Python::with_gil(|py| {
            let ax = self.ax.bind(py);
            let rect = request.resolve(
                figure_width(ax)?,
                || rendered_bounds(ax, renderer.bind(py)))?;
            Ok(rect)
        })
    }

    /// Prepare a vertical colorbar for `image`, to the right of this
    /// axes.  See [`ColorbarBuilder`] for the options.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use plothelper::{fixed_size_subplots, GridSpec, Style};
    /// let (fig, mut axs) = fixed_size_subplots(&GridSpec::default(),
    ///                                          &Style::default())?;
    /// let ax = axs.get_mut(0, 0).unwrap();
    /// let im = ax.imshow(&ndarray::Array2::eye(10), "viridis")?;
    /// ax.colorbar(&im).pad(0.05).aspect(20.).label("level").add()?;
    /// # Ok::<(), plothelper::Error>(())
    /// ```
    #[must_use]
    pub fn colorbar<'a>(&'a self, image: &'a Image) -> ColorbarBuilder<'a> {
        ColorbarBuilder { axes: self, image, pad: 0.05, aspect: 20.,
                          floating: None, label: None }
    }
}

/// Options of a line plot started by [`Axes::xy`].
pub struct XY<'a, D>
where D: ?Sized {
    axes: &'a Axes,
    x: &'a D,
    y: &'a D,
    fmt: &'a str,
    label: &'a str,
    linewidth: Option<f64>,
}

impl<'a, D> XY<'a, D>
where D: Data + ?Sized {
    #[must_use]
    pub fn fmt(mut self, fmt: &'a str) -> Self {
        self.fmt = fmt;
        self
    }

    #[must_use]
    pub fn label(mut self, label: &'a str) -> Self {
        self.label = label;
        self
    }

    #[must_use]
    pub fn linewidth(mut self, w: f64) -> Self {
        self.linewidth = Some(w);
        self
    }

    /// Plot the data with the options specified in [`XY`].
    pub fn plot(self) -> Result<(), Error> {
        let matplotlib = pymod!(MATPLOTLIB)?;
        Python::with_gil(|py| {
            styled(py, matplotlib, &self.axes.style, || {
                let kwargs = PyDict::new_bound(py);
                if !self.label.is_empty() {
                    kwargs.set_item("label", self.label)?
                }
                if let Some(w) = self.linewidth {
                    kwargs.set_item("linewidth", w)?
                }
                let x = self.x.to_numpy(py);
                let y = self.y.to_numpy(py);
                self.axes.ax.bind(py)
                    .call_method("plot", (x, y, self.fmt), Some(&kwargs))
            })?;
            Ok(())
        })
    }
}

/// Options of a colorbar started by [`Axes::colorbar`].
///
/// By default the colorbar is *fixed*: it is `pad` inches to the right
/// of the axes and `aspect` times narrower than it, and it follows
/// the axes' drawn position, so it keeps the height of images whose
/// aspect is locked.  A [floating](ColorbarBuilder::floating)
/// colorbar instead takes its room from the axes.
#[must_use]
pub struct ColorbarBuilder<'a> {
    axes: &'a Axes,
    image: &'a Image,
    pad: f64,
    aspect: f64,
    floating: Option<f64>,
    label: Option<&'a str>,
}

impl<'a> ColorbarBuilder<'a> {
    /// Space between the axes and the colorbar, in inches.
    pub fn pad(mut self, pad: f64) -> Self {
        self.pad = pad;
        self
    }

    /// Ratio of the axes width to the colorbar width.
    pub fn aspect(mut self, aspect: f64) -> Self {
        self.aspect = aspect;
        self
    }

    /// Shrink the axes to make room for the colorbar, separated from
    /// it by `pad_fraction` times the colorbar width.
    pub fn floating(mut self, pad_fraction: f64) -> Self {
        self.floating = Some(pad_fraction);
        self
    }

    pub fn label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    /// Create the colorbar axes and draw the colorbar in it.
    pub fn add(self) -> Result<Colorbar, Error> {
        let matplotlib = pymod!(MATPLOTLIB)?;
        let cb = match self.floating {
            None => self.add_fixed(matplotlib)?,
            Some(pad_fraction) => self.add_floating(matplotlib, pad_fraction)?,
        };
        Ok(Colorbar { cb, style: Arc::clone(&self.axes.style) })
    }

    fn add_fixed(&self, matplotlib: &Py<PyModule>) -> Result<PyObject, Error> {
        let request = SiblingRequest::new(self.pad, self.aspect)?;
        // Imported now, the locator uses it during draws.
        pymod!(TRANSFORMS)?;
        Python::with_gil(|py| {
            let ax = self.axes.ax.bind(py);
            let fig = ax.getattr("figure")?;
            // Initial position, moved by the locator at draw time.
            let rect = request.resolve(figure_width(ax)?, || position(ax))?;
            let locator = Py::new(py, RightLocator {
                request, reference: ax.clone().unbind() })?;
            let cb = styled(py, matplotlib, &self.axes.style, || {
                let kwargs = PyDict::new_bound(py);
                kwargs.set_item("axes_locator", locator)?;
                let cax = fig.call_method(
                    "add_axes", (vec![rect.x, rect.y, rect.width, rect.height],),
                    Some(&kwargs))?;
                self.draw_colorbar(&fig, &cax)
            })?;
            tracing::debug!(pad = self.pad, aspect = self.aspect,
                            "added fixed colorbar");
            Ok(cb.unbind())
        })
    }

    fn add_floating(&self, matplotlib: &Py<PyModule>, pad_fraction: f64)
                    -> Result<PyObject, Error> {
        SiblingRequest::new(pad_fraction, self.aspect)?;
        let axes_grid = pymod!(AXES_GRID)?;
        let axes_size = pymod!(AXES_SIZE)?;
        Python::with_gil(|py| {
            let ax = self.axes.ax.bind(py);
            let fig = ax.getattr("figure")?;
            let cb = styled(py, matplotlib, &self.axes.style, || {
                let divider = axes_grid.bind(py)
                    .call_method1("make_axes_locatable", (ax.clone(),))?;
                let size = axes_size.bind(py);
                let kwargs = PyDict::new_bound(py);
                kwargs.set_item("aspect", 1. / self.aspect)?;
                let width = size.getattr("AxesY")?
                    .call((ax.clone(),), Some(&kwargs))?;
                let pad = size.getattr("Fraction")?
                    .call1((pad_fraction, width.clone()))?;
                let kwargs = PyDict::new_bound(py);
                kwargs.set_item("size", width)?;
                kwargs.set_item("pad", pad)?;
                let cax = divider.call_method("append_axes", ("right",),
                                              Some(&kwargs))?;
                self.draw_colorbar(&fig, &cax)
            })?;
            tracing::debug!(pad_fraction, aspect = self.aspect,
                            "added floating colorbar");
            Ok(cb.unbind())
        })
    }

    fn draw_colorbar<'py>(&self, fig: &Bound<'py, PyAny>,
                          cax: &Bound<'py, PyAny>)
                          -> PyResult<Bound<'py, PyAny>> {
        let py = fig.py();
        let kwargs = PyDict::new_bound(py);
        kwargs.set_item("cax", cax)?;
        if let Some(label) = self.label {
            kwargs.set_item("label", label)?
        }
        fig.call_method("colorbar", (self.image.im.clone_ref(py),),
                        Some(&kwargs))
    }
}

impl Colorbar {
    /// The axes the colorbar is drawn in.
    pub fn axes(&self) -> Result<Axes, Error> {
        Python::with_gil(|py| {
            let ax = self.cb.bind(py).getattr("ax")?;
            Ok(Axes { ax: ax.unbind(), style: Arc::clone(&self.style) })
        })
    }

    pub fn set_label(&mut self, label: &str) -> Result<&mut Self, Error> {
        let matplotlib = pymod!(MATPLOTLIB)?;
        Python::with_gil(|py| {
            styled(py, matplotlib, &self.style, || {
                self.cb.bind(py).call_method1("set_label", (label,))
                    .map(|_| ())
            })
        })?;
        Ok(self)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    /// The tests below drive a real Matplotlib.
    fn have_matplotlib() -> bool {
        let found = PYPLOT.is_ok() && AXES_GRID.is_ok();
        if !found {
            eprintln!("matplotlib cannot be imported; skipping");
        }
        found
    }

    fn close(a: f64, b: f64) -> bool { (a - b).abs() < 1e-6 }

    fn image_data(n: usize) -> Array2<f64> {
        Array2::from_shape_fn((n, n), |(i, j)| ((i * j) as f64).sin())
    }

    #[test]
    fn axes_are_placed_on_the_grid() -> Result<(), Error> {
        if !have_matplotlib() { return Ok(()) }
        let spec = GridSpec::new(2, 3).cell_size(1.5, 1.).separation(0.2, 0.1);
        let (fig, axs) = fixed_size_subplots(&spec, &Style::default())?;
        let (w, h) = fig.size()?;
        let g = axs.cells().geometry();
        assert!(close(w, g.width) && close(h, g.height));
        assert_eq!(axs.iter().count(), 6);
        for ((r, c), ax) in axs.iter() {
            let p = ax.position()?;
            let cell = axs.cells().cell(r, c).unwrap();
            assert!(close(p.x0, cell.x) && close(p.y0, cell.y), "({}, {})", r, c);
            assert!(close(p.width, cell.width) && close(p.height, cell.height));
        }
        Ok(())
    }

    #[test]
    fn malformed_spec_creates_no_figure() {
        let r = fixed_size_subplots(&GridSpec::new(0, 2), &Style::default());
        assert!(matches!(r, Err(Error::Geometry(_))));
    }

    #[test]
    fn a_basic_row() -> Result<(), Error> {
        if !have_matplotlib() { return Ok(()) }
        let spec = GridSpec::new(1, 3).cell_size(1.5, 1.5);
        let (fig, axs) = fixed_size_subplots(&spec, &Style::default())?;
        let [[mut ax0, mut ax1, mut ax2]] = axs.into_array().unwrap();
        let x = [1., 2., 3., 4.];
        ax0.xy(&x, &[1., 4., 2., 3.]).plot()?;
        ax1.xy(&x, &[1., 4., 2., 3.]).fmt(".").plot()?;
        ax2.xy(&x, &[1., 4., 2., 3.]).fmt("r").linewidth(1.).label("r").plot()?;
        ax0.set_title("Plots of the same size")?.set_xlabel("X Axis")?
            .set_ylabel("Y Axis")?.minorticks_on()?;
        fig.save().to_file("target/a_basic_row.pdf")?;
        Ok(())
    }

    #[test]
    fn into_array_checks_the_shape() -> Result<(), Error> {
        if !have_matplotlib() { return Ok(()) }
        let (_fig, axs) = fixed_size_subplots(&GridSpec::new(2, 2),
                                              &Style::default())?;
        assert!(axs.clone().into_array::<1, 4>().is_none());
        assert!(axs.into_array::<2, 2>().is_some());
        Ok(())
    }

    #[test]
    fn fixed_colorbar_follows_its_axes() -> Result<(), Error> {
        if !have_matplotlib() { return Ok(()) }
        let spec = GridSpec::new(2, 2).cell_size(1.5, 1.5);
        let (fig, mut axs) = fixed_size_subplots(&spec, &Style::default())?;
        let ax = axs.get_mut(0, 1).unwrap();
        let im = ax.imshow(&image_data(10), "viridis")?;
        let cb = ax.colorbar(&im).pad(0.05).aspect(20.).label("level").add()?;
        fig.save().to_file("target/fixed_colorbar.png")?;
        let (w, _) = fig.size()?;
        let r = ax.position()?;
        let c = cb.axes()?.position()?;
        assert!(close(c.x0, r.x0 + r.width + 0.05 / w));
        assert!(close(c.width, r.width / 20.));
        assert!(close(c.y0, r.y0) && close(c.height, r.height));
        Ok(())
    }

    #[test]
    fn fixed_colorbar_is_placed_at_draw_time() -> Result<(), Error> {
        if !have_matplotlib() { return Ok(()) }
        let spec = GridSpec::new(1, 1).cell_size(1.5, 3.);
        let (fig, mut axs) = fixed_size_subplots(&spec, &Style::default())?;
        let cell = *axs.cells().cell(0, 0).unwrap();
        let ax = axs.get_mut(0, 0).unwrap();
        let im = ax.imshow(&image_data(10), "viridis")?;
        let cb = ax.colorbar(&im).add()?;
        // Widen the data after the colorbar exists: the locked aspect
        // halves the height of the image axes.
        Python::with_gil(|py| {
            ax.ax.bind(py).call_method1("set_xlim", ((-0.5, 19.5),))
                .map(|_| ())
        })?;
        fig.draw()?;
        let (_, h) = fig.size()?;
        let r = ax.position()?;
        let c = cb.axes()?.position()?;
        assert!(close(r.height * h, 0.75));
        assert!(!close(r.height, cell.height));
        assert!(!close(r.y0, cell.y));
        assert!(close(c.y0, r.y0) && close(c.height, r.height));
        Ok(())
    }

    #[test]
    fn eager_sibling_matches_pure_placement() -> Result<(), Error> {
        if !have_matplotlib() { return Ok(()) }
        let (fig, axs) = fixed_size_subplots(&GridSpec::default(),
                                             &Style::default())?;
        let ax = &axs[(0, 0)];
        let now = ax.sibling_now(0.1, 10.)?;
        let p = ax.position()?;
        let expected = divider::place_sibling(
            0.1, 10., || Ok::<_, std::convert::Infallible>(p), fig.size()?.0)
            .unwrap();
        assert!(close(now.x, expected.x) && close(now.width, expected.width));
        assert!(matches!(ax.sibling_now(0.1, 0.),
                         Err(Error::Geometry(_))));
        Ok(())
    }

    #[test]
    fn floating_colorbar() -> Result<(), Error> {
        if !have_matplotlib() { return Ok(()) }
        let (fig, mut axs) = fixed_size_subplots(&GridSpec::default(),
                                                 &Style::default())?;
        let ax = axs.get_mut(0, 0).unwrap();
        let before = ax.position()?;
        let im = ax.imshow(&image_data(20), "PRGn")?;
        let mut cb = ax.colorbar(&im).aspect(30.).floating(0.5).add()?;
        cb.set_label("value")?;
        fig.draw()?;
        // The colorbar is taken from the room of the axes.
        assert!(cb.axes()?.position()?.x0 < before.x0 + before.width);
        Ok(())
    }

    #[test]
    fn images_have_unit_aspect() -> Result<(), Error> {
        if !have_matplotlib() { return Ok(()) }
        let (fig, mut axs) = fixed_size_subplots(&GridSpec::default(),
                                                 &Style::default())?;
        let ax = axs.get_mut(0, 0).unwrap();
        ax.imshow(&image_data(8), "gray")?;
        fig.draw()?;
        assert!(close(ax.aspect()?, 1.));
        Ok(())
    }

    #[test]
    fn save_all_formats() -> Result<(), Error> {
        if !have_matplotlib() { return Ok(()) }
        let style = Style::default().layer(&Style::preset(
            crate::style::Preset::Transparent));
        let (fig, mut axs) = fixed_size_subplots(&GridSpec::new(1, 1), &style)?;
        axs.get_mut(0, 0).unwrap().xy(&[0., 1.], &[1., 0.]).plot()?;
        let paths = fig.save_all("target/save_all.v1", &Format::ALL)?;
        assert_eq!(paths, vec![PathBuf::from("target/save_all.v1.png"),
                               PathBuf::from("target/save_all.v1.svg"),
                               PathBuf::from("target/save_all.v1.pdf")]);
        for p in &paths {
            assert!(p.exists(), "{} missing", p.display());
        }
        Ok(())
    }

    #[test]
    fn use_style_validates_values() -> Result<(), Error> {
        if !have_matplotlib() { return Ok(()) }
        use_style(&Style::empty().set("axes.labelpad", 2.5))?;
        let r = use_style(&Style::empty().set("lines.linewidth", "wide"));
        assert!(matches!(r, Err(Error::Python(_))));
        Ok(())
    }

    #[test]
    fn missing_directory() -> Result<(), Error> {
        if !have_matplotlib() { return Ok(()) }
        let (fig, _axs) = fixed_size_subplots(&GridSpec::default(),
                                              &Style::default())?;
        let r = fig.save().dpi(72.).to_file("target/no/such/dir/fig.png");
        assert!(matches!(r, Err(Error::FileNotFoundError)));
        Ok(())
    }
}
