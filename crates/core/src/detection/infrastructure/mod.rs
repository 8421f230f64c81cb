pub mod landmark_metrics_extractor;
pub mod recorded_landmark_detector;
