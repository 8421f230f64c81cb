use crate::shared::constants::{GUIDE_ASPECT_RATIO, GUIDE_WIDTH_FRACTION};
use crate::shared::rect::{require_positive_size, GeometryError, Rect};

/// Bounding rectangle of the on-screen guide oval, in viewfinder coordinates.
///
/// Rebuilt whenever the viewport geometry changes, constant otherwise.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetRegion {
    rect: Rect,
}

impl TargetRegion {
    pub fn new(rect: Rect) -> Result<Self, GeometryError> {
        require_positive_size("target region", rect.width, rect.height)?;
        if !rect.x.is_finite() || !rect.y.is_finite() {
            return Err(GeometryError::InvalidOrigin {
                what: "target region",
                x: rect.x,
                y: rect.y,
            });
        }
        Ok(Self { rect })
    }

    /// Guide oval for a `width` x `height` view.
    ///
    /// The oval is horizontally centred and vertically centred in the band
    /// between `top_inset` and `height - bottom_inset`, never rising above
    /// `top_inset`.
    pub fn for_viewport(
        width: f64,
        height: f64,
        top_inset: f64,
        bottom_inset: f64,
    ) -> Result<Self, GeometryError> {
        require_positive_size("viewport", width, height)?;
        let oval_w = width * GUIDE_WIDTH_FRACTION;
        let oval_h = oval_w * GUIDE_ASPECT_RATIO;
        let x = (width - oval_w) / 2.0;
        let available = height - top_inset - bottom_inset;
        let y = (top_inset + (available - oval_h) / 2.0).max(top_inset);
        Self::new(Rect::new(x, y, oval_w, oval_h))
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn width(&self) -> f64 {
        self.rect.width
    }

    pub fn height(&self) -> f64 {
        self.rect.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rejects_empty_rect() {
        assert!(TargetRegion::new(Rect::new(0.0, 0.0, 0.0, 100.0)).is_err());
    }

    #[test]
    fn test_rejects_non_finite_origin() {
        let err = TargetRegion::new(Rect::new(f64::NAN, 0.0, 10.0, 10.0)).unwrap_err();
        assert!(matches!(err, GeometryError::InvalidOrigin { .. }));
    }

    #[test]
    fn test_for_viewport_geometry() {
        // 400 wide: oval 260 x 325, x = 70
        // band 100..(900-80) = 720 tall, y = 100 + (720 - 325) / 2 = 297.5
        let t = TargetRegion::for_viewport(400.0, 900.0, 100.0, 80.0).unwrap();
        let r = t.rect();
        assert_relative_eq!(r.width, 260.0);
        assert_relative_eq!(r.height, 325.0);
        assert_relative_eq!(r.x, 70.0);
        assert_relative_eq!(r.y, 297.5);
    }

    #[test]
    fn test_for_viewport_never_above_top_inset() {
        // Band too short for the oval: pinned to the top inset
        let t = TargetRegion::for_viewport(400.0, 300.0, 60.0, 80.0).unwrap();
        assert_relative_eq!(t.rect().y, 60.0);
    }

    #[test]
    fn test_for_viewport_rejects_empty_view() {
        assert!(TargetRegion::for_viewport(0.0, 900.0, 0.0, 0.0).is_err());
    }
}
