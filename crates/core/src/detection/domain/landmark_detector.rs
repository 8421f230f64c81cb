use serde::{Deserialize, Serialize};

use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

/// A face as reported by a landmark detector, before any view mapping.
///
/// `bounding_box` and eye points are normalized to the upright image with a
/// bottom-left origin and y growing upward. Each axis is normalized
/// independently, so eye shapes must be scaled back to pixels before any
/// aspect measurement.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFaceObservation {
    pub bounding_box: Rect,
    #[serde(default)]
    pub yaw: Option<f64>,
    #[serde(default)]
    pub roll: Option<f64>,
    #[serde(default)]
    pub left_eye: Option<Vec<(f64, f64)>>,
    #[serde(default)]
    pub right_eye: Option<Vec<(f64, f64)>>,
}

/// Domain interface for facial-landmark detection.
///
/// Implementations may be stateful (e.g., replaying a recording), hence `&mut self`.
pub trait LandmarkDetector: Send {
    fn detect(&mut self, frame: &Frame)
        -> Result<Vec<RawFaceObservation>, Box<dyn std::error::Error>>;
}
