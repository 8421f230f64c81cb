use std::time::Duration;

use thiserror::Error;

use crate::shared::constants::{
    ANGLE_TOLERANCE_DEGREES, BLINK_TIMEOUT_SECS, EYE_CLOSURE_THRESHOLD, MAX_SIZE_RATIO,
    MIN_SIZE_RATIO, POSITION_TOLERANCE, REQUIRED_STABLE_FRAMES, TARGET_HEIGHT_FRACTION,
};

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("required stable frames must be at least 1")]
    NoStableFrames,
    #[error("blink timeout must be greater than zero")]
    ZeroBlinkTimeout,
    #[error("blink timeout of {0} s is out of range")]
    BlinkTimeoutOutOfRange(f64),
    #[error("{name} must be a finite non-negative number, got {value}")]
    InvalidTolerance { name: &'static str, value: f64 },
    #[error("target height fraction must be in (0, 1], got {0}")]
    InvalidTargetFraction(f64),
    #[error("size band is inverted: min ratio {min} exceeds max ratio {max}")]
    InvertedSizeBand { min: f64, max: f64 },
}

/// Immutable per-session evaluator parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    pub liveness_required: bool,
    pub auto_capture_enabled: bool,
    pub required_stable_frames: u32,
    pub blink_timeout: Duration,
    /// Fraction of the target region size the face center may drift.
    pub position_tolerance: f64,
    pub angle_tolerance_degrees: f64,
    pub target_height_fraction: f64,
    pub min_size_ratio: f64,
    pub max_size_ratio: f64,
    pub eye_closure_threshold: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            liveness_required: false,
            auto_capture_enabled: true,
            required_stable_frames: REQUIRED_STABLE_FRAMES,
            blink_timeout: Duration::from_secs_f64(BLINK_TIMEOUT_SECS),
            position_tolerance: POSITION_TOLERANCE,
            angle_tolerance_degrees: ANGLE_TOLERANCE_DEGREES,
            target_height_fraction: TARGET_HEIGHT_FRACTION,
            min_size_ratio: MIN_SIZE_RATIO,
            max_size_ratio: MAX_SIZE_RATIO,
            eye_closure_threshold: EYE_CLOSURE_THRESHOLD,
        }
    }
}

impl SessionConfig {
    pub fn with_liveness(mut self, required: bool) -> Self {
        self.liveness_required = required;
        self
    }

    pub fn with_auto_capture(mut self, enabled: bool) -> Self {
        self.auto_capture_enabled = enabled;
        self
    }

    pub fn with_required_stable_frames(mut self, frames: u32) -> Self {
        self.required_stable_frames = frames;
        self
    }

    pub fn with_blink_timeout(mut self, timeout: Duration) -> Self {
        self.blink_timeout = timeout;
        self
    }

    pub fn with_position_tolerance(mut self, tolerance: f64) -> Self {
        self.position_tolerance = tolerance;
        self
    }

    pub fn with_angle_tolerance(mut self, degrees: f64) -> Self {
        self.angle_tolerance_degrees = degrees;
        self
    }

    pub fn with_size_band(mut self, min_ratio: f64, max_ratio: f64) -> Self {
        self.min_size_ratio = min_ratio;
        self.max_size_ratio = max_ratio;
        self
    }

    pub fn with_eye_closure_threshold(mut self, threshold: f64) -> Self {
        self.eye_closure_threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.required_stable_frames == 0 {
            return Err(ConfigError::NoStableFrames);
        }
        if self.blink_timeout.is_zero() {
            return Err(ConfigError::ZeroBlinkTimeout);
        }
        let tolerances = [
            ("position tolerance", self.position_tolerance),
            ("angle tolerance", self.angle_tolerance_degrees),
            ("min size ratio", self.min_size_ratio),
            ("max size ratio", self.max_size_ratio),
            ("eye closure threshold", self.eye_closure_threshold),
        ];
        for (name, value) in tolerances {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidTolerance { name, value });
            }
        }
        let fraction = self.target_height_fraction;
        if !(fraction.is_finite() && fraction > 0.0 && fraction <= 1.0) {
            return Err(ConfigError::InvalidTargetFraction(fraction));
        }
        if self.min_size_ratio > self.max_size_ratio {
            return Err(ConfigError::InvertedSizeBand {
                min: self.min_size_ratio,
                max: self.max_size_ratio,
            });
        }
        Ok(())
    }
}
