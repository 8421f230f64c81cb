use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum GeometryError {
    #[error("{what} must have positive finite dimensions, got {width}x{height}")]
    InvalidSize {
        what: &'static str,
        width: f64,
        height: f64,
    },
    #[error("{what} has non-finite origin ({x}, {y})")]
    InvalidOrigin { what: &'static str, x: f64, y: f64 },
}

/// Axis-aligned rectangle in floating-point coordinates.
///
/// Origin is top-left with y growing downward unless a caller documents
/// otherwise (detector-native rectangles use a bottom-left origin).
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn mid_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn mid_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// True when both dimensions are finite and non-negative.
    pub fn is_well_formed(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width >= 0.0
            && self.height >= 0.0
    }

    /// Smallest rectangle with integral bounds that contains this one.
    pub fn integral(&self) -> Rect {
        let x = self.x.floor();
        let y = self.y.floor();
        Rect {
            x,
            y,
            width: self.max_x().ceil() - x,
            height: self.max_y().ceil() - y,
        }
    }
}

/// Checks that a viewport-like size is positive and finite.
pub fn require_positive_size(
    what: &'static str,
    width: f64,
    height: f64,
) -> Result<(), GeometryError> {
    let valid = |v: f64| v.is_finite() && v > 0.0;
    if valid(width) && valid(height) {
        Ok(())
    } else {
        Err(GeometryError::InvalidSize {
            what,
            width,
            height,
        })
    }
}

/// Bounding box of a point cloud, or `None` for an empty cloud.
pub fn bounding_box(points: &[(f64, f64)]) -> Option<Rect> {
    let (&(x0, y0), rest) = points.split_first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (x0, y0, x0, y0);
    for &(x, y) in rest {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_midpoints() {
        let r = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_relative_eq!(r.mid_x(), 60.0);
        assert_relative_eq!(r.mid_y(), 45.0);
    }

    #[test]
    fn test_integral_expands_outward() {
        let r = Rect::new(10.4, 20.6, 99.2, 50.1).integral();
        assert_eq!(r, Rect::new(10.0, 20.0, 100.0, 51.0));
    }

    #[test]
    fn test_integral_keeps_whole_numbers() {
        let r = Rect::new(3.0, 4.0, 5.0, 6.0);
        assert_eq!(r.integral(), r);
    }

    #[rstest]
    #[case::regular(Rect::new(0.0, 0.0, 10.0, 10.0), true)]
    #[case::empty(Rect::new(5.0, 5.0, 0.0, 0.0), true)]
    #[case::negative_width(Rect::new(0.0, 0.0, -1.0, 10.0), false)]
    #[case::negative_height(Rect::new(0.0, 0.0, 10.0, -1.0), false)]
    #[case::nan(Rect::new(f64::NAN, 0.0, 10.0, 10.0), false)]
    #[case::infinite(Rect::new(0.0, 0.0, f64::INFINITY, 10.0), false)]
    fn test_is_well_formed(#[case] r: Rect, #[case] expected: bool) {
        assert_eq!(r.is_well_formed(), expected);
    }

    #[rstest]
    #[case::zero_width(0.0, 10.0)]
    #[case::negative_height(10.0, -1.0)]
    #[case::nan(f64::NAN, 10.0)]
    fn test_require_positive_size_rejects(#[case] w: f64, #[case] h: f64) {
        assert!(require_positive_size("view", w, h).is_err());
    }

    #[test]
    fn test_require_positive_size_accepts() {
        assert_eq!(require_positive_size("view", 390.0, 844.0), Ok(()));
    }

    #[test]
    fn test_bounding_box_empty() {
        assert!(bounding_box(&[]).is_none());
    }

    #[test]
    fn test_bounding_box_of_points() {
        let b = bounding_box(&[(1.0, 5.0), (4.0, 2.0), (2.0, 3.0)]).unwrap();
        assert_eq!(b, Rect::new(1.0, 2.0, 3.0, 3.0));
    }
}
