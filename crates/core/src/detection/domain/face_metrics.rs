use crate::shared::constants::EYE_CLOSURE_THRESHOLD;
use crate::shared::rect::Rect;

/// Openness assumed for an eye without an estimate, so missing data never
/// reads as a closed eye.
const OPEN_EYE: f64 = 1.0;

/// One face observed in one frame, in viewfinder coordinates.
///
/// Produced fresh per frame and carries no identity across frames.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceMetrics {
    pub region: Rect,
    /// Head rotation about the vertical axis, radians.
    pub yaw: Option<f64>,
    /// In-plane head rotation, radians.
    pub roll: Option<f64>,
    pub left_eye_openness: Option<f64>,
    pub right_eye_openness: Option<f64>,
}

impl FaceMetrics {
    pub fn new(region: Rect) -> Self {
        Self {
            region,
            yaw: None,
            roll: None,
            left_eye_openness: None,
            right_eye_openness: None,
        }
    }

    pub fn with_angles(mut self, yaw: Option<f64>, roll: Option<f64>) -> Self {
        self.yaw = yaw;
        self.roll = roll;
        self
    }

    pub fn with_eye_openness(mut self, left: Option<f64>, right: Option<f64>) -> Self {
        self.left_eye_openness = left;
        self.right_eye_openness = right;
        self
    }

    /// Both eyes below the default closure threshold.
    pub fn eyes_closed(&self) -> bool {
        self.eyes_closed_below(EYE_CLOSURE_THRESHOLD)
    }

    /// Both eyes below `threshold`. An absent estimate counts as open.
    pub fn eyes_closed_below(&self, threshold: f64) -> bool {
        let left = self.left_eye_openness.unwrap_or(OPEN_EYE);
        let right = self.right_eye_openness.unwrap_or(OPEN_EYE);
        left < threshold && right < threshold
    }
}
