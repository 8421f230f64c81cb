/// Eye openness ratio below which an eye counts as closed.
pub const EYE_CLOSURE_THRESHOLD: f64 = 0.19;

/// Consecutive qualifying frames required before auto-capture fires.
pub const REQUIRED_STABLE_FRAMES: u32 = 12;

/// Seconds without an observed blink before the subject is asked to blink.
pub const BLINK_TIMEOUT_SECS: f64 = 5.0;

/// Allowed face-center offset, as a fraction of the target region size.
pub const POSITION_TOLERANCE: f64 = 0.14;

/// Allowed absolute yaw/roll in degrees.
pub const ANGLE_TOLERANCE_DEGREES: f64 = 10.0;

/// Ideal face height as a fraction of the target region height.
pub const TARGET_HEIGHT_FRACTION: f64 = 0.80;

/// Face height band relative to the ideal height: below is too far, above too close.
pub const MIN_SIZE_RATIO: f64 = 0.65;
pub const MAX_SIZE_RATIO: f64 = 1.25;

/// Eye landmark clouds with fewer points yield no openness estimate.
pub const MIN_EYE_LANDMARKS: usize = 6;

/// Floor for eye extents so the openness ratio never divides by zero.
pub const MIN_EYE_EXTENT: f64 = 0.0001;

/// Guide oval: width relative to the view, height relative to the oval width.
pub const GUIDE_WIDTH_FRACTION: f64 = 0.65;
pub const GUIDE_ASPECT_RATIO: f64 = 1.25;

pub const SESSION_TIMEOUT_SECS: u64 = 180;
pub const MAX_VALIDATIONS: u32 = 3;

pub const TRACE_EXTENSIONS: &[&str] = &["jsonl", "ndjson", "json"];
