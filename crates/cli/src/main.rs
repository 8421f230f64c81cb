use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use serde::Serialize;

use facegate_core::capture::domain::capture_session::{
    CaptureSession, SessionEvent, SessionOutcome,
};
use facegate_core::capture::domain::photo_capturer::PhotoCapturer;
use facegate_core::capture::domain::target_region::TargetRegion;
use facegate_core::capture::infrastructure::threaded_capture_session::ThreadedCaptureSession;
use facegate_core::capture::session_logger::{SessionLogger, StdoutSessionLogger};
use facegate_core::detection::domain::metrics_extractor::MetricsExtractor;
use facegate_core::detection::domain::viewfinder::Viewfinder;
use facegate_core::detection::infrastructure::landmark_metrics_extractor::LandmarkMetricsExtractor;
use facegate_core::detection::infrastructure::recorded_landmark_detector::{
    read_trace, RecordedLandmarkDetector, TraceRecord,
};
use facegate_core::shared::capture_settings::{CameraSide, CaptureSettings};
use facegate_core::shared::constants::TRACE_EXTENSIONS;
use facegate_core::shared::frame::Frame;

/// Replays a recorded face-landmark trace through the capture gate.
#[derive(Parser)]
#[command(name = "facegate")]
struct Cli {
    /// JSON-lines trace: one `{"timestamp": .., "faces": [..]}` record per frame.
    trace: PathBuf,

    /// Settings file (defaults to the platform config directory).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Require a blink within the liveness window.
    #[arg(long, conflicts_with = "no_liveness")]
    liveness: bool,

    /// Skip the blink requirement.
    #[arg(long)]
    no_liveness: bool,

    /// Only report readiness; never request a capture.
    #[arg(long)]
    no_auto_capture: bool,

    /// Consecutive aligned frames required before capturing.
    #[arg(long)]
    stable_frames: Option<u32>,

    /// Seconds without a blink before asking for one.
    #[arg(long)]
    blink_timeout: Option<f64>,

    /// Session timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,

    /// Failed captures allowed before giving up.
    #[arg(long)]
    max_validations: Option<u32>,

    /// Preview size in points, WIDTHxHEIGHT.
    #[arg(long, default_value = "390x844")]
    viewport: String,

    /// Camera image size in pixels, WIDTHxHEIGHT.
    #[arg(long, default_value = "1080x1920")]
    frame_size: String,

    /// Camera the trace was recorded with: front or back.
    #[arg(long)]
    camera_side: Option<CameraSide>,

    /// Run through the threaded session, paced by trace timestamps.
    #[arg(long)]
    realtime: bool,

    /// Make the first N capture attempts fail.
    #[arg(long, default_value = "0")]
    fail_captures: u32,

    /// Write a JSON report of the replay.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Serialize)]
struct ReplayReport {
    trace: PathBuf,
    realtime: bool,
    frames: usize,
    frames_evaluated: usize,
    dropped_frames: usize,
    capture_requests: usize,
    failed_captures: u32,
    outcome: Option<SessionOutcome>,
    events: Vec<ReportEntry>,
}

#[derive(Serialize)]
struct ReportEntry {
    at_secs: f64,
    #[serde(flatten)]
    event: SessionEvent,
}

/// Fails the first `remaining_failures` attempts, then succeeds.
struct ScriptedCapturer {
    remaining_failures: u32,
}

impl PhotoCapturer for ScriptedCapturer {
    fn capture(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if self.remaining_failures > 0 {
            self.remaining_failures -= 1;
            return Err(format!("simulated capture failure on frame {}", frame.index()).into());
        }
        log::info!(
            "Captured frame {} at {:.3}s",
            frame.index(),
            frame.timestamp().as_secs_f64()
        );
        Ok(())
    }
}

struct Replay {
    records: Arc<Vec<TraceRecord>>,
    session: CaptureSession,
    viewfinder: Viewfinder,
    frame_size: (u32, u32),
    fail_captures: u32,
}

impl Replay {
    fn extractor(&self) -> Box<dyn MetricsExtractor> {
        Box::new(LandmarkMetricsExtractor::new(Box::new(
            RecordedLandmarkDetector::new(self.records.clone()),
        )))
    }

    fn capturer(&self) -> ScriptedCapturer {
        ScriptedCapturer {
            remaining_failures: self.fail_captures,
        }
    }

    /// Payload-free frames stamped with the recorded capture times.
    fn frames(&self) -> Vec<Frame> {
        let (w, h) = self.frame_size;
        self.records
            .iter()
            .enumerate()
            .map(|(index, record)| Frame::empty(w, h, index).with_timestamp(record.timestamp()))
            .collect()
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let settings = resolve_settings(&cli)?;
    let (view_w, view_h) = parse_size(&cli.viewport, "viewport")?;
    let (view_w, view_h) = (f64::from(view_w), f64::from(view_h));
    let frame_size = parse_size(&cli.frame_size, "frame size")?;

    let viewfinder = Viewfinder::for_camera_side(view_w, view_h, settings.camera_side)?;
    let target = TargetRegion::for_viewport(view_w, view_h, 0.0, 0.0)?;
    let session = CaptureSession::new(
        settings.session_config()?,
        settings.limits(),
        target,
        Duration::ZERO,
    )?;

    let records = Arc::new(read_trace(&cli.trace)?);
    log::info!(
        "Replaying {} frames from {} ({} camera, liveness {})",
        records.len(),
        cli.trace.display(),
        settings.camera_side,
        if settings.liveness_required { "on" } else { "off" },
    );

    let replay = Replay {
        records,
        session,
        viewfinder,
        frame_size,
        fail_captures: cli.fail_captures,
    };
    let mut report = if cli.realtime {
        run_realtime(replay)?
    } else {
        run_sync(replay)
    };
    report.trace = cli.trace.clone();

    if let Some(outcome) = report.outcome {
        println!("Outcome: {outcome}");
    }

    if let Some(path) = &cli.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)?;
        log::info!("Report written to {}", path.display());
    }

    Ok(())
}

/// Deterministic replay on the calling thread, using trace timestamps as the clock.
///
/// A trace that ends before the session finishes cancels it.
fn run_sync(replay: Replay) -> ReplayReport {
    let mut extractor = replay.extractor();
    let mut capturer = replay.capturer();
    let frames = replay.frames();
    let total = frames.len();
    let Replay {
        mut session,
        viewfinder,
        ..
    } = replay;
    let mut logger = StdoutSessionLogger::default();
    let mut entries = Vec::new();
    let mut now = Duration::ZERO;

    for frame in frames {
        now = frame.timestamp();
        let start = Instant::now();
        let detection = extractor.extract(&frame, &viewfinder);
        logger.timing("extract", elapsed_ms(start));

        let events = session.process_frame(detection, now);
        logger.frame(frame.index(), session.guidance());

        for event in events {
            let requested = event == SessionEvent::CaptureRequested;
            record_event(&mut entries, now, event);
            if requested {
                let result = capturer.capture(&frame).map_err(|e| e.to_string());
                for follow_up in session.complete_capture(result) {
                    record_event(&mut entries, now, follow_up);
                }
            }
        }

        if session.is_finished() {
            break;
        }
    }

    for event in session.cancel() {
        record_event(&mut entries, now, event);
    }
    logger.summary();
    build_report(&session, total, 0, false, entries)
}

/// Replay through the threaded session, pushing frames at their recorded times.
///
/// Closing the feed at the end of the trace cancels an unfinished session.
fn run_realtime(replay: Replay) -> Result<ReplayReport, Box<dyn std::error::Error>> {
    let extractor = replay.extractor();
    let capturer = Box::new(replay.capturer());
    let frames = replay.frames();
    let total = frames.len();

    let (feed, handle) = ThreadedCaptureSession::new(replay.viewfinder).spawn(
        replay.session,
        extractor,
        capturer,
        Box::new(StdoutSessionLogger::default()),
    );

    let origin = Instant::now();
    let mut entries = Vec::new();
    for frame in frames {
        if let Some(wait) = frame.timestamp().checked_sub(origin.elapsed()) {
            std::thread::sleep(wait);
        }
        drain_events(handle.events(), origin, &mut entries);
        if !feed.push(frame) {
            break;
        }
    }

    let dropped = feed.dropped_frames();
    drop(feed);

    let events = handle.events().clone();
    let session = handle.join()?;
    drain_events(&events, origin, &mut entries);
    Ok(build_report(&session, total, dropped, true, entries))
}

fn drain_events(
    events: &crossbeam_channel::Receiver<SessionEvent>,
    origin: Instant,
    entries: &mut Vec<ReportEntry>,
) {
    for event in events.try_iter() {
        record_event(entries, origin.elapsed(), event);
    }
}

fn record_event(entries: &mut Vec<ReportEntry>, now: Duration, event: SessionEvent) {
    print_event(&event);
    entries.push(ReportEntry {
        at_secs: now.as_secs_f64(),
        event,
    });
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::StateChanged(t) => {
            println!("{} -> {} [{}]", t.from, t.to, t.to.message_key())
        }
        SessionEvent::CaptureRequested => println!("capture requested"),
        SessionEvent::CaptureFailed { attempt, reason } => {
            println!("capture attempt {attempt} failed: {reason}")
        }
        SessionEvent::Finished { outcome } => println!("session finished: {outcome}"),
    }
}

fn build_report(
    session: &CaptureSession,
    frames: usize,
    dropped_frames: usize,
    realtime: bool,
    events: Vec<ReportEntry>,
) -> ReplayReport {
    let capture_requests = events
        .iter()
        .filter(|e| e.event == SessionEvent::CaptureRequested)
        .count();
    ReplayReport {
        trace: PathBuf::new(),
        realtime,
        frames,
        frames_evaluated: session.frames_evaluated(),
        dropped_frames,
        capture_requests,
        failed_captures: session.failed_attempts(),
        outcome: session.outcome(),
        events,
    }
}

fn resolve_settings(cli: &Cli) -> Result<CaptureSettings, Box<dyn std::error::Error>> {
    let mut settings = match &cli.settings {
        Some(path) => CaptureSettings::from_file(path)?,
        None => CaptureSettings::load(),
    };
    if cli.liveness {
        settings.liveness_required = true;
    }
    if cli.no_liveness {
        settings.liveness_required = false;
    }
    if cli.no_auto_capture {
        settings.auto_capture = false;
    }
    if let Some(frames) = cli.stable_frames {
        settings.required_stable_frames = Some(frames);
    }
    if let Some(secs) = cli.blink_timeout {
        settings.blink_timeout_secs = Some(secs);
    }
    if let Some(secs) = cli.timeout {
        settings.session_timeout_secs = secs;
    }
    if let Some(n) = cli.max_validations {
        settings.max_validations = n;
    }
    if let Some(side) = cli.camera_side {
        settings.camera_side = side;
    }
    Ok(settings)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.trace.exists() {
        return Err(format!("Trace file not found: {}", cli.trace.display()).into());
    }
    if !is_trace(&cli.trace) {
        return Err(format!(
            "Unsupported trace extension: {} (expected one of {})",
            cli.trace.display(),
            TRACE_EXTENSIONS.join(", ")
        )
        .into());
    }
    if cli.stable_frames == Some(0) {
        return Err("--stable-frames must be at least 1".into());
    }
    if let Some(secs) = cli.blink_timeout {
        if !(secs.is_finite() && secs > 0.0) {
            return Err(format!("--blink-timeout must be positive, got {secs}").into());
        }
    }
    if cli.timeout == Some(0) {
        return Err("--timeout must be at least 1 second".into());
    }
    if cli.max_validations == Some(0) {
        return Err("--max-validations must be at least 1".into());
    }
    Ok(())
}

fn is_trace(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| TRACE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn parse_size(value: &str, what: &str) -> Result<(u32, u32), Box<dyn std::error::Error>> {
    let parsed = value
        .split_once(|c| c == 'x' || c == 'X')
        .and_then(|(w, h)| Some((w.trim().parse::<u32>().ok()?, h.trim().parse::<u32>().ok()?)));
    match parsed {
        Some((w, h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(format!("Invalid {what} '{value}', expected WIDTHxHEIGHT").into()),
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("390x844", "viewport").unwrap(), (390, 844));
        assert_eq!(parse_size("1080X1920", "frame size").unwrap(), (1080, 1920));
        assert!(parse_size("390", "viewport").is_err());
        assert!(parse_size("0x844", "viewport").is_err());
        assert!(parse_size("axb", "viewport").is_err());
    }

    #[test]
    fn test_is_trace() {
        assert!(is_trace(Path::new("session.jsonl")));
        assert!(is_trace(Path::new("session.JSON")));
        assert!(!is_trace(Path::new("session.txt")));
        assert!(!is_trace(Path::new("session")));
    }

    #[test]
    fn test_scripted_capturer_fails_then_succeeds() {
        let mut capturer = ScriptedCapturer {
            remaining_failures: 2,
        };
        let frame = Frame::empty(4, 4, 0);
        assert!(capturer.capture(&frame).is_err());
        assert!(capturer.capture(&frame).is_err());
        assert!(capturer.capture(&frame).is_ok());
    }

    /// Replay of `frames` records at 30 fps with one centered, correctly sized face.
    fn centered_face_replay(dir: &tempfile::TempDir, frames: usize, fail_captures: u32) -> Replay {
        let path = dir.path().join("trace.jsonl");
        let face = r#"{"bounding_box":{"x":0.3,"y":0.3,"width":0.4,"height":0.4}}"#;
        let lines: Vec<String> = (0..frames)
            .map(|i| format!(r#"{{"timestamp":{:.3},"faces":[{face}]}}"#, i as f64 / 30.0))
            .collect();
        std::fs::write(&path, lines.join("\n")).unwrap();

        let settings = CaptureSettings {
            liveness_required: false,
            ..CaptureSettings::default()
        };
        let records = Arc::new(read_trace(&path).unwrap());
        let viewfinder = Viewfinder::new(400.0, 400.0).unwrap();
        let target = TargetRegion::new(facegate_core::shared::rect::Rect::new(
            80.0, 60.0, 240.0, 300.0,
        ))
        .unwrap();
        let session = CaptureSession::new(
            settings.session_config().unwrap(),
            settings.limits(),
            target,
            Duration::ZERO,
        )
        .unwrap();
        Replay {
            records,
            session,
            viewfinder,
            frame_size: (400, 400),
            fail_captures,
        }
    }

    #[test]
    fn test_sync_replay_captures_centered_face() {
        let dir = tempfile::TempDir::new().unwrap();
        let report = run_sync(centered_face_replay(&dir, 20, 1));

        assert_eq!(report.outcome, Some(SessionOutcome::Cancelled));
        assert_eq!(report.capture_requests, 1);
        assert_eq!(report.failed_captures, 1);
        assert_eq!(report.frames_evaluated, 20);
        assert!(!report.realtime);
    }

    #[test]
    fn test_realtime_replay_captures_centered_face() {
        let dir = tempfile::TempDir::new().unwrap();
        let report = run_realtime(centered_face_replay(&dir, 30, 0)).unwrap();

        assert!(report.realtime);
        assert_eq!(report.frames, 30);
        assert_eq!(report.outcome, Some(SessionOutcome::Captured));
        assert_eq!(report.capture_requests, 1);
        assert_eq!(report.failed_captures, 0);
        assert!(report.frames_evaluated >= 12);
        assert!(report.frames_evaluated + report.dropped_frames <= report.frames);
        assert_eq!(
            report.events.last().map(|entry| &entry.event),
            Some(&SessionEvent::Finished {
                outcome: SessionOutcome::Captured
            })
        );
    }

    #[test]
    fn test_realtime_replay_cancels_when_trace_ends() {
        let dir = tempfile::TempDir::new().unwrap();
        let report = run_realtime(centered_face_replay(&dir, 5, 0)).unwrap();

        assert_eq!(report.outcome, Some(SessionOutcome::Cancelled));
        assert_eq!(report.capture_requests, 0);
    }
}
