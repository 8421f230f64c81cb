//! Eye openness from a landmark point cloud.
//!
//! The ratio of vertical to horizontal extent of the eye's bounding box is a
//! cheap proxy for the eye aspect ratio: it drops sharply when the lids meet
//! and is insensitive to how the detector orders its contour points.

use crate::shared::constants::{MIN_EYE_EXTENT, MIN_EYE_LANDMARKS};
use crate::shared::rect::bounding_box;

/// Height/width ratio of the eye contour, or `None` when fewer than
/// [`MIN_EYE_LANDMARKS`] points are available.
pub fn eye_openness(points: &[(f64, f64)]) -> Option<f64> {
    if points.len() < MIN_EYE_LANDMARKS {
        return None;
    }
    let bounds = bounding_box(points)?;
    let width = bounds.width.max(MIN_EYE_EXTENT);
    let height = bounds.height.max(MIN_EYE_EXTENT);
    Some(height / width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Six-point eye contour spanning `w` x `h`.
    fn contour(w: f64, h: f64) -> Vec<(f64, f64)> {
        vec![
            (0.0, h / 2.0),
            (w / 3.0, 0.0),
            (2.0 * w / 3.0, 0.0),
            (w, h / 2.0),
            (2.0 * w / 3.0, h),
            (w / 3.0, h),
        ]
    }

    #[test]
    fn test_open_eye_ratio() {
        assert_relative_eq!(eye_openness(&contour(0.1, 0.04)).unwrap(), 0.4, epsilon = 1e-9);
    }

    #[test]
    fn test_closed_eye_ratio() {
        assert_relative_eq!(eye_openness(&contour(0.1, 0.01)).unwrap(), 0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_too_few_points_gives_no_estimate() {
        let mut pts = contour(0.1, 0.04);
        pts.pop();
        assert!(eye_openness(&pts).is_none());
    }

    #[test]
    fn test_empty_gives_no_estimate() {
        assert!(eye_openness(&[]).is_none());
    }

    #[test]
    fn test_degenerate_width_is_clamped() {
        // All points on a vertical line: width floors at MIN_EYE_EXTENT
        let pts = vec![(0.5, 0.0), (0.5, 0.1), (0.5, 0.2), (0.5, 0.3), (0.5, 0.4), (0.5, 0.5)];
        let ratio = eye_openness(&pts).unwrap();
        assert!(ratio.is_finite());
        assert_relative_eq!(ratio, 0.5 / MIN_EYE_EXTENT, epsilon = 1e-6);
    }

    #[test]
    fn test_fully_collapsed_cloud_is_one() {
        let pts = vec![(0.5, 0.5); 6];
        assert_relative_eq!(eye_openness(&pts).unwrap(), 1.0);
    }

    #[test]
    fn test_extra_points_are_accepted() {
        let mut pts = contour(0.2, 0.05);
        pts.push((0.1, 0.025));
        pts.push((0.15, 0.03));
        assert_relative_eq!(eye_openness(&pts).unwrap(), 0.25, epsilon = 1e-9);
    }
}
