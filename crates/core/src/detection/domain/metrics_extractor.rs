use crate::detection::domain::face_metrics::FaceMetrics;
use crate::detection::domain::viewfinder::Viewfinder;
use crate::shared::frame::Frame;

/// Turns one frame into per-face metrics in viewfinder coordinates.
///
/// An error means this single frame could not be processed; hosts treat it
/// as "no faces this frame" and keep the session running.
pub trait MetricsExtractor: Send {
    fn extract(
        &mut self,
        frame: &Frame,
        viewfinder: &Viewfinder,
    ) -> Result<Vec<FaceMetrics>, Box<dyn std::error::Error>>;
}
