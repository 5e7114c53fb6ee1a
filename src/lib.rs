//! Fixed-size subplot layouts and colorbars for the [Matplotlib][]
//! Python visualization library, from [Rust][].
//!
//! Usage
//! -----
//!
#![cfg_attr(feature = "pyplot", doc = r#"
Axes created by [`fixed_size_subplots`] have a size given in
inches, whatever the number of rows and columns: the figure grows
to hold them.  Colorbars added with [`Axes::colorbar`] keep that
size too, sitting next to the axes instead of taking room from it.

```no_run
use plothelper::{fixed_size_subplots, GridSpec, Style};
let spec = GridSpec::new(2, 2).cell_size(1.5, 1.5);
let (fig, mut axs) = fixed_size_subplots(&spec, &Style::default())?;
let ax = axs.get_mut(0, 1).unwrap();
let im = ax.imshow(&ndarray::Array2::eye(16), "viridis")?;
ax.colorbar(&im).add()?;
fig.save_all("target/figure", &plothelper::Format::ALL)?;
# Ok::<(), plothelper::Error>(())
```
"#)]
//!
//! The geometry lives in [`layout`] and [`divider`] and does not
//! need Python.  Without the default `pyplot` feature, only these,
//! [`style`] and [`stylesheet`] are built.
//!
//! [Rust]: https://www.rust-lang.org/
//! [Matplotlib]: https://matplotlib.org/

use std::fmt::{Display, Formatter};
#[cfg(feature = "pyplot")]
use pyo3::PyErr;

pub mod layout;
pub mod divider;
pub mod style;
pub mod stylesheet;
#[cfg(feature = "pyplot")]
mod pyplot;

pub use layout::{compute_grid, CellGrid, CellRect, FigureGeometry,
                 GeometryError, GridSpec};
pub use divider::{place_sibling, PlacementError, RenderedBounds,
                  SiblingRect, SiblingRequest};
pub use style::{Param, Preset, Style};
pub use stylesheet::SheetError;
#[cfg(feature = "pyplot")]
pub use pyplot::{fixed_size_subplots, use_style, Axes, AxesGrid, Colorbar,
                 ColorbarBuilder, Data, Figure, Format, Image, Savefig, XY};

#[cfg(all(doctest, feature = "pyplot"))]
doc_comment::doctest!("../README.md");

/// Possible errors of plothelper functions.
#[derive(Debug)]
pub enum Error {
    /// The Python library "matplotlib" was not found.
    NoMatplotlib,
    /// The path contains an element that is not a directory or does
    /// not exist.
    FileNotFoundError,
    /// Permission denied to access or create the filesystem path.
    PermissionError,
    /// The Matplotlib backend (named) provides no renderer.
    NoRenderer(String),
    /// Malformed grid or placement parameters.
    Geometry(GeometryError),
    /// A style sheet could not be read.
    Sheet(SheetError),
    /// Other Python errors.
    #[cfg(feature = "pyplot")]
    Python(PyErr),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Error::NoMatplotlib =>
                write!(f, "The matplotlib library has not been found.\n\
Please install it.  See https://matplotlib.org/\n\
If you use Anaconda, see https://github.com/PyO3/pyo3/issues/1554"),
            Error::FileNotFoundError =>
                write!(f, "A path contains an element that is not a \
                           directory or does not exist"),
            Error::PermissionError =>
                write!(f, "Permission denied to access or create the \
                           filesystem path"),
            Error::NoRenderer(backend) =>
                write!(f, "Could not find a renderer for the '{}' backend",
                       backend),
            Error::Geometry(e) => write!(f, "{}", e),
            Error::Sheet(e) => write!(f, "{}", e),
            #[cfg(feature = "pyplot")]
            Error::Python(e) =>
                write!(f, "Python error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Geometry(e) => Some(e),
            Error::Sheet(e) => Some(e),
            #[cfg(feature = "pyplot")]
            Error::Python(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GeometryError> for Error {
    fn from(e: GeometryError) -> Self { Error::Geometry(e) }
}

impl From<SheetError> for Error {
    fn from(e: SheetError) -> Self { Error::Sheet(e) }
}

#[cfg(feature = "pyplot")]
impl From<PyErr> for Error {
    fn from(e: PyErr) -> Self { Error::Python(e) }
}

/// Errors of a resolver talking to Python are reported as such.
#[cfg(feature = "pyplot")]
impl From<PlacementError<PyErr>> for Error {
    fn from(e: PlacementError<PyErr>) -> Self {
        match e {
            PlacementError::Geometry(e) => Error::Geometry(e),
            PlacementError::ResolverUnavailable(e) => Error::Python(e),
        }
    }
}
