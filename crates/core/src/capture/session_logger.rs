use std::collections::HashMap;
use std::time::Instant;

use crate::capture::domain::guidance_state::GuidanceState;

/// Observer for capture-session activity.
///
/// Hosts plug in whatever output they need (stdout summary, UI telemetry,
/// nothing) without touching the session runner.
pub trait SessionLogger: Send {
    /// Record the guidance state produced for one frame.
    fn frame(&mut self, index: usize, guidance: GuidanceState);

    /// Record how long a named stage (`extract`, `evaluate`, `capture`) took.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. dropped frames, face count).
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Emit an end-of-session summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards everything.
pub struct NullSessionLogger;

impl SessionLogger for NullSessionLogger {
    fn frame(&mut self, _index: usize, _guidance: GuidanceState) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Accumulates timings, metrics and per-state frame counts, and reports a
/// summary through `log` when the session ends.
///
/// Per-frame output is throttled to every `throttle_frames` frames.
pub struct StdoutSessionLogger {
    throttle_frames: usize,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    state_frames: HashMap<GuidanceState, usize>,
    start_time: Instant,
    total_frames: usize,
    messages: Vec<String>,
}

impl StdoutSessionLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            state_frames: HashMap::new(),
            start_time: Instant::now(),
            total_frames: 0,
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary string, or `None` if no frame was seen.
    pub fn summary_string(&self) -> Option<String> {
        if self.total_frames == 0 {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.total_frames;
        let mut lines = vec![format!(
            "Session summary ({frames} frames, {:.1}s total):",
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = mean(durations);
            lines.push(format!(
                "  {stage:10}: avg {avg_ms:6.2}ms  total {total_ms:7.1}ms"
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            let avg = mean(&self.metrics[name]);
            lines.push(format!("  {name}: avg {avg:.1}"));
        }

        for state in GuidanceState::ALL {
            if let Some(count) = self.state_frames.get(state) {
                let pct = *count as f64 / frames as f64 * 100.0;
                lines.push(format!("  {state}: {count} frames ({pct:.1}%)"));
            }
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }

    /// Frames spent in each guidance state so far.
    pub fn state_frames(&self) -> &HashMap<GuidanceState, usize> {
        &self.state_frames
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl Default for StdoutSessionLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl SessionLogger for StdoutSessionLogger {
    fn frame(&mut self, index: usize, guidance: GuidanceState) {
        self.total_frames += 1;
        *self.state_frames.entry(guidance).or_default() += 1;
        if index % self.throttle_frames == 0 {
            log::info!("Frame {index}: {guidance}");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullSessionLogger;
        logger.frame(0, GuidanceState::NoFace);
        logger.timing("extract", 5.0);
        logger.metric("dropped_frames", 3.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timing_records_values() {
        let mut logger = StdoutSessionLogger::new(10);
        logger.timing("extract", 20.0);
        logger.timing("extract", 30.0);
        logger.timing("evaluate", 0.5);

        assert_eq!(logger.timings_for("extract").unwrap(), &[20.0, 30.0]);
        assert_eq!(logger.timings_for("evaluate").unwrap().len(), 1);
        assert!(logger.timings_for("capture").is_none());
    }

    #[test]
    fn test_metric_records_values() {
        let mut logger = StdoutSessionLogger::new(10);
        logger.metric("dropped_frames", 3.0);
        logger.metric("dropped_frames", 4.0);
        assert_relative_eq!(mean(logger.metrics_for("dropped_frames").unwrap()), 3.5);
    }

    #[test]
    fn test_frame_counts_per_state() {
        let mut logger = StdoutSessionLogger::new(10);
        for i in 0..3 {
            logger.frame(i, GuidanceState::NoFace);
        }
        for i in 3..10 {
            logger.frame(i, GuidanceState::HoldSteady);
        }
        assert_eq!(logger.total_frames, 10);
        assert_eq!(logger.state_frames()[&GuidanceState::NoFace], 3);
        assert_eq!(logger.state_frames()[&GuidanceState::HoldSteady], 7);
        assert!(!logger.state_frames().contains_key(&GuidanceState::TooFar));
    }

    #[test]
    fn test_summary_includes_stages_metrics_and_states() {
        let mut logger = StdoutSessionLogger::new(10);
        logger.frame(0, GuidanceState::TooFar);
        logger.frame(1, GuidanceState::HoldSteady);
        logger.timing("extract", 12.0);
        logger.metric("face_count", 1.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Session summary (2 frames"));
        assert!(summary.contains("extract"));
        assert!(summary.contains("face_count: avg 1.0"));
        assert!(summary.contains("too far"));
        assert!(summary.contains("hold steady"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        let mut logger = StdoutSessionLogger::new(10);
        logger.timing("extract", 1.0);
        assert!(logger.summary_string().is_none());
    }

    #[test]
    fn test_info_stores_messages() {
        let mut logger = StdoutSessionLogger::new(10);
        logger.info("hello world");
        assert_eq!(logger.messages, vec!["hello world".to_string()]);
    }

    #[test]
    fn test_default_throttle() {
        assert_eq!(StdoutSessionLogger::default().throttle_frames, 30);
    }

    #[test]
    fn test_zero_throttle_clamped() {
        assert_eq!(StdoutSessionLogger::new(0).throttle_frames, 1);
    }
}
