use crate::shared::frame::Frame;

/// Host-side still capture, triggered once the evaluator signals capture-now.
///
/// The capturer owns whatever it produces (file, upload, buffer); the session
/// only needs to know whether it worked.
pub trait PhotoCapturer: Send {
    fn capture(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}
