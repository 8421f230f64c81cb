use crate::detection::domain::eye_openness::eye_openness;
use crate::detection::domain::face_metrics::FaceMetrics;
use crate::detection::domain::landmark_detector::{LandmarkDetector, RawFaceObservation};
use crate::detection::domain::metrics_extractor::MetricsExtractor;
use crate::detection::domain::viewfinder::Viewfinder;
use crate::shared::frame::Frame;

/// Adapts any [`LandmarkDetector`] into a [`MetricsExtractor`].
///
/// Boxes are mapped into the viewfinder using the frame's upright size;
/// eye openness is estimated from each eye's landmark cloud after scaling
/// it to pixels, so non-square frames keep the eye's true proportions.
pub struct LandmarkMetricsExtractor {
    detector: Box<dyn LandmarkDetector>,
}

impl LandmarkMetricsExtractor {
    pub fn new(detector: Box<dyn LandmarkDetector>) -> Self {
        Self { detector }
    }

    fn to_metrics(
        observation: &RawFaceObservation,
        viewfinder: &Viewfinder,
        image_size: (u32, u32),
    ) -> FaceMetrics {
        let region = viewfinder.map_normalized_rect(observation.bounding_box, image_size);
        let left = observation
            .left_eye
            .as_deref()
            .and_then(|points| eye_openness_in_pixels(points, image_size));
        let right = observation
            .right_eye
            .as_deref()
            .and_then(|points| eye_openness_in_pixels(points, image_size));
        FaceMetrics::new(region)
            .with_angles(observation.yaw, observation.roll)
            .with_eye_openness(left, right)
    }
}

fn eye_openness_in_pixels(points: &[(f64, f64)], image_size: (u32, u32)) -> Option<f64> {
    let (width, height) = (f64::from(image_size.0), f64::from(image_size.1));
    if width <= 0.0 || height <= 0.0 {
        return eye_openness(points);
    }
    let scaled: Vec<(f64, f64)> = points.iter().map(|&(x, y)| (x * width, y * height)).collect();
    eye_openness(&scaled)
}

impl MetricsExtractor for LandmarkMetricsExtractor {
    fn extract(
        &mut self,
        frame: &Frame,
        viewfinder: &Viewfinder,
    ) -> Result<Vec<FaceMetrics>, Box<dyn std::error::Error>> {
        let observations = self.detector.detect(frame)?;
        let image_size = frame.oriented_size();
        Ok(observations
            .iter()
            .map(|obs| Self::to_metrics(obs, viewfinder, image_size))
            .collect())
    }
}
