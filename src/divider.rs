//! Placement of an axes next to another one.
//!
//! The rectangle of a reference axes is only final once Matplotlib
//! has drawn it (locked aspect ratios shrink it at draw time), so a
//! sibling is placed in two phases: a [`SiblingRequest`] is created
//! and validated up front, then [`SiblingRequest::resolve`] is run by
//! the renderer with a resolver returning the reference's true bounds.

use std::fmt::{Display, Formatter};
use crate::layout::GeometryError;

/// Rectangle of the reference axes, in figure fractions, as known
/// at draw time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedBounds {
    pub x0: f64,
    pub y0: f64,
    pub width: f64,
    pub height: f64,
}

impl From<(f64, f64, f64, f64)> for RenderedBounds {
    fn from((x0, y0, width, height): (f64, f64, f64, f64)) -> Self {
        RenderedBounds { x0, y0, width, height }
    }
}

/// Rectangle of the sibling axes, in figure fractions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiblingRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Failure to place a sibling.
#[derive(Debug)]
pub enum PlacementError<E> {
    Geometry(GeometryError),
    /// The resolver could not supply the reference bounds.
    ResolverUnavailable(E),
}

impl<E: Display> Display for PlacementError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            PlacementError::Geometry(e) => write!(f, "{}", e),
            PlacementError::ResolverUnavailable(e) =>
                write!(f, "reference bounds unavailable: {}", e),
        }
    }
}

impl<E> std::error::Error for PlacementError<E>
where E: std::error::Error + 'static {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlacementError::Geometry(e) => Some(e),
            PlacementError::ResolverUnavailable(e) => Some(e),
        }
    }
}

impl<E> From<GeometryError> for PlacementError<E> {
    fn from(e: GeometryError) -> Self { PlacementError::Geometry(e) }
}

/// A validated request to place an axes to the right of a reference
/// one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiblingRequest {
    pad: f64,
    aspect: f64,
}

impl SiblingRequest {
    /// Request a sibling separated from the reference by `pad` inches
    /// and whose width is the reference width divided by `aspect`.
    pub fn new(pad: f64, aspect: f64) -> Result<Self, GeometryError> {
        if !aspect.is_finite() || aspect <= 0. {
            return Err(GeometryError::InvalidAspect(aspect))
        }
        if !pad.is_finite() || pad < 0. {
            return Err(GeometryError::InvalidPad(pad))
        }
        Ok(SiblingRequest { pad, aspect })
    }

    pub fn pad(&self) -> f64 { self.pad }

    pub fn aspect(&self) -> f64 { self.aspect }

    /// Place the sibling.  `resolver` is called once, after
    /// `figure_width` (inches) has been checked, and its error is
    /// returned unchanged.
    pub fn resolve<F, E>(&self, figure_width: f64, resolver: F)
                         -> Result<SiblingRect, PlacementError<E>>
    where F: FnOnce() -> Result<RenderedBounds, E> {
        if !figure_width.is_finite() || figure_width <= 0. {
            return Err(GeometryError::InvalidSpec(format!(
                "figure width {} must be > 0", figure_width)).into())
        }
        let b = resolver().map_err(PlacementError::ResolverUnavailable)?;
        Ok(SiblingRect {
            x: b.x0 + b.width + self.pad / figure_width,
            y: b.y0,
            width: b.width / self.aspect,
            height: b.height,
        })
    }
}

/// One-shot form of [`SiblingRequest::new`] followed by
/// [`SiblingRequest::resolve`].
pub fn place_sibling<F, E>(pad: f64, aspect: f64, resolver: F,
                           figure_width: f64)
                           -> Result<SiblingRect, PlacementError<E>>
where F: FnOnce() -> Result<RenderedBounds, E> {
    SiblingRequest::new(pad, aspect)?.resolve(figure_width, resolver)
}

/// Ratio of the display aspect of an axes to the aspect of its data
/// limits.  `figure_size` is in inches, `axes_size` in figure
/// fractions.  Equals 1 when one data unit is as long on both axes;
/// inverted axes (as drawn by `imshow`) do not change the result.
pub fn display_aspect(figure_size: (f64, f64), axes_size: (f64, f64),
                      xlim: (f64, f64), ylim: (f64, f64)) -> f64 {
    let display = (figure_size.1 * axes_size.1) / (figure_size.0 * axes_size.0);
    let data = ((ylim.1 - ylim.0) / (xlim.1 - xlim.0)).abs();
    display / data
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::convert::Infallible;

    fn close(a: f64, b: f64) -> bool { (a - b).abs() < 1e-12 }

    fn reference() -> Result<RenderedBounds, Infallible> {
        Ok(RenderedBounds { x0: 0.1, y0: 0.1, width: 0.6, height: 0.6 })
    }

    #[test]
    fn colorbar_example() -> Result<(), PlacementError<Infallible>> {
        let s = place_sibling(0.05, 20., reference, 5.)?;
        assert!(close(s.x, 0.71));
        assert!(close(s.width, 0.03));
        assert_eq!(s.y, 0.1);
        assert_eq!(s.height, 0.6);
        Ok(())
    }

    #[test]
    fn unit_aspect_keeps_width() -> Result<(), PlacementError<Infallible>> {
        let s = place_sibling(0.3, 1., reference, 4.)?;
        assert_eq!(s.width, 0.6);
        Ok(())
    }

    #[test]
    fn zero_pad_touches_reference() -> Result<(), PlacementError<Infallible>> {
        let s = place_sibling(0., 7., reference, 4.)?;
        assert_eq!(s.x, 0.1 + 0.6);
        Ok(())
    }

    #[test]
    fn resolver_runs_once_at_resolution() {
        let calls = Cell::new(0);
        let request = SiblingRequest::new(0.05, 20.).unwrap();
        assert_eq!(calls.get(), 0);
        let r = request.resolve(5., || { calls.set(calls.get() + 1); reference() });
        assert!(r.is_ok());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn rejects_bad_parameters() {
        assert_eq!(SiblingRequest::new(0.05, 0.),
                   Err(GeometryError::InvalidAspect(0.)));
        assert_eq!(SiblingRequest::new(0.05, -2.),
                   Err(GeometryError::InvalidAspect(-2.)));
        assert_eq!(SiblingRequest::new(-0.01, 20.),
                   Err(GeometryError::InvalidPad(-0.01)));
        let calls = Cell::new(0);
        let r = SiblingRequest::new(0.05, 20.).unwrap()
            .resolve(0., || { calls.set(calls.get() + 1); reference() });
        assert!(matches!(r, Err(PlacementError::Geometry(
            GeometryError::InvalidSpec(_)))));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn resolver_error_is_propagated() {
        #[derive(Debug, PartialEq)]
        struct NoRenderer;
        let r = place_sibling(0.05, 20., || Err(NoRenderer), 5.);
        match r {
            Err(PlacementError::ResolverUnavailable(e)) =>
                assert_eq!(e, NoRenderer),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn aspect_of_square_data_in_square_axes() {
        let a = display_aspect((4., 4.), (0.5, 0.5), (0., 10.), (0., 10.));
        assert!(close(a, 1.));
        let a = display_aspect((8., 4.), (0.5, 0.5), (0., 1.), (0., 1.));
        assert!(close(a, 0.5));
        let a = display_aspect((4., 4.), (0.5, 0.5), (-0.5, 9.5), (9.5, -0.5));
        assert!(close(a, 1.));
    }
}
