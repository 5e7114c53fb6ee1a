//! Fixed-size subplot grids.
//!
//! A [`GridSpec`] describes, in inches, the margins, separations and
//! cell sizes of a grid of axes.  [`compute_grid`] turns it into the
//! figure size and the position of every cell as fractions of that
//! figure, which is what Matplotlib's `Figure.add_axes` expects.
//!
//! Horizontally, a three column grid looks like
//!
//! ```text
//! | left | cell | left + col_sep | cell | left + col_sep | cell | col_sep + left * right_scale |
//! ```
//!
//! and the same holds vertically, from the bottom up, with the bottom
//! margin, the row separation and the top margin scale.

use std::fmt::{Display, Formatter};

/// Errors raised by malformed geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// The grid specification cannot produce a valid layout.
    InvalidSpec(String),
    /// The sibling aspect must be finite and `> 0`.
    InvalidAspect(f64),
    /// The sibling padding must be finite and `≥ 0`.
    InvalidPad(f64),
}

impl Display for GeometryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            GeometryError::InvalidSpec(msg) =>
                write!(f, "invalid grid specification: {}", msg),
            GeometryError::InvalidAspect(a) =>
                write!(f, "invalid aspect {} (must be > 0)", a),
            GeometryError::InvalidPad(p) =>
                write!(f, "invalid padding {} (must be >= 0)", p),
        }
    }
}

impl std::error::Error for GeometryError {}

/// Grid of fixed-size axes.  All distances are in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub rows: usize,
    pub cols: usize,
    /// Left margin, also the base of the space between columns.
    pub left_margin: f64,
    /// Bottom margin, also the base of the space between rows.
    pub bottom_margin: f64,
    /// The right margin is `left_margin * right_margin_scale`.
    pub right_margin_scale: f64,
    /// The top margin is `bottom_margin * top_margin_scale`.
    pub top_margin_scale: f64,
    /// Extra space between columns.
    pub col_sep: f64,
    /// Extra space between rows.
    pub row_sep: f64,
    pub cell_width: f64,
    pub cell_height: f64,
}

impl Default for GridSpec {
    fn default() -> Self {
        GridSpec {
            rows: 1, cols: 1,
            left_margin: 0.7, bottom_margin: 0.7,
            right_margin_scale: 0.6, top_margin_scale: 0.6,
            col_sep: 0., row_sep: 0.,
            cell_width: 2., cell_height: 2.,
        }
    }
}

impl GridSpec {
    /// A `rows` × `cols` grid with the default margins and 2in × 2in
    /// cells.
    pub fn new(rows: usize, cols: usize) -> Self {
        GridSpec { rows, cols, ..Self::default() }
    }

    #[must_use]
    pub fn cell_size(mut self, width: f64, height: f64) -> Self {
        self.cell_width = width;
        self.cell_height = height;
        self
    }

    #[must_use]
    pub fn margins(mut self, left: f64, bottom: f64) -> Self {
        self.left_margin = left;
        self.bottom_margin = bottom;
        self
    }

    #[must_use]
    pub fn separation(mut self, col_sep: f64, row_sep: f64) -> Self {
        self.col_sep = col_sep;
        self.row_sep = row_sep;
        self
    }

    #[must_use]
    pub fn margin_scales(mut self, right: f64, top: f64) -> Self {
        self.right_margin_scale = right;
        self.top_margin_scale = top;
        self
    }

    fn validate(&self) -> Result<(), GeometryError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(GeometryError::InvalidSpec(format!(
                "{} × {} grid has no cell", self.rows, self.cols)))
        }
        let distances = [
            ("left_margin", self.left_margin),
            ("bottom_margin", self.bottom_margin),
            ("right_margin_scale", self.right_margin_scale),
            ("top_margin_scale", self.top_margin_scale),
            ("col_sep", self.col_sep),
            ("row_sep", self.row_sep),
            ("cell_width", self.cell_width),
            ("cell_height", self.cell_height),
        ];
        for (name, v) in distances {
            if !v.is_finite() || v < 0. {
                return Err(GeometryError::InvalidSpec(format!(
                    "{} = {} must be finite and non-negative", name, v)))
            }
        }
        Ok(())
    }
}

/// Physical size of the figure holding a [`GridSpec`], in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FigureGeometry {
    pub width: f64,
    pub height: f64,
}

impl FigureGeometry {
    pub fn of(spec: &GridSpec) -> Self {
        let width = spec.cols as f64
            * (spec.left_margin + spec.col_sep + spec.cell_width)
            + spec.left_margin * spec.right_margin_scale;
        let height = spec.rows as f64
            * (spec.bottom_margin + spec.row_sep + spec.cell_height)
            + spec.bottom_margin * spec.top_margin_scale;
        FigureGeometry { width, height }
    }
}

/// Rectangle of a cell, as fractions of the figure width and height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CellRect {
    pub fn right(&self) -> f64 { self.x + self.width }

    pub fn top(&self) -> f64 { self.y + self.height }

    /// `[x, y, width, height]`, the `rect` of `Figure.add_axes`.
    pub fn bounds(&self) -> [f64; 4] {
        [self.x, self.y, self.width, self.height]
    }

    /// Whether the interiors of `self` and `other` intersect.
    pub fn overlaps(&self, other: &CellRect) -> bool {
        self.x < other.right() && other.x < self.right()
            && self.y < other.top() && other.y < self.top()
    }
}

/// Output of [`compute_grid`]: the figure size and one rectangle per
/// cell.  Row 0 is the bottom row.
#[derive(Debug, Clone, PartialEq)]
pub struct CellGrid {
    geometry: FigureGeometry,
    rows: usize,
    cols: usize,
    cells: Vec<CellRect>, // row-major
}

impl CellGrid {
    pub fn geometry(&self) -> FigureGeometry { self.geometry }

    pub fn rows(&self) -> usize { self.rows }

    pub fn cols(&self) -> usize { self.cols }

    /// The cell at `(row, col)`, counting rows from the bottom.
    pub fn cell(&self, row: usize, col: usize) -> Option<&CellRect> {
        if row < self.rows && col < self.cols {
            self.cells.get(row * self.cols + col)
        } else {
            None
        }
    }

    /// The cell at `(row, col)`, counting rows from the top.
    pub fn cell_from_top(&self, row: usize, col: usize) -> Option<&CellRect> {
        if row < self.rows {
            self.cell(self.rows - 1 - row, col)
        } else {
            None
        }
    }

    /// Iterate over `((row, col), rect)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &CellRect)> {
        let cols = self.cols;
        self.cells.iter().enumerate().map(move |(i, r)| ((i / cols, i % cols), r))
    }
}

/// Start offsets of `n` spans of length `size`, the first preceded by
/// `margin` and the others by `margin + sep`.
fn offsets(n: usize, margin: f64, sep: f64, size: f64) -> Vec<f64> {
    let mut offset = 0.;
    (0 .. n).map(|i| {
        offset += if i == 0 { margin } else { margin + sep };
        let start = offset;
        offset += size;
        start
    }).collect()
}

/// Compute the figure size and the cell rectangles of `spec`.
pub fn compute_grid(spec: &GridSpec) -> Result<CellGrid, GeometryError> {
    spec.validate()?;
    let geometry = FigureGeometry::of(spec);
    if geometry.width <= 0. || geometry.height <= 0. {
        return Err(GeometryError::InvalidSpec(format!(
            "figure of size {} × {} is empty", geometry.width, geometry.height)))
    }
    if !geometry.width.is_finite() || !geometry.height.is_finite() {
        return Err(GeometryError::InvalidSpec(format!(
            "figure of size {} × {} is too large",
            geometry.width, geometry.height)))
    }
    let xs = offsets(spec.cols, spec.left_margin, spec.col_sep,
                     spec.cell_width);
    let ys = offsets(spec.rows, spec.bottom_margin, spec.row_sep,
                     spec.cell_height);
    let width = spec.cell_width / geometry.width;
    let height = spec.cell_height / geometry.height;
    let mut cells = Vec::with_capacity(spec.rows * spec.cols);
    for y in &ys {
        for x in &xs {
            cells.push(CellRect {
                x: x / geometry.width,
                y: y / geometry.height,
                width, height,
            });
        }
    }
    tracing::debug!(rows = spec.rows, cols = spec.cols,
                    width = geometry.width, height = geometry.height,
                    "computed fixed-size grid");
    Ok(CellGrid { geometry, rows: spec.rows, cols: spec.cols, cells })
}
