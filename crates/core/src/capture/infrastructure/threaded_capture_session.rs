use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};

use crate::capture::domain::capture_session::{CaptureSession, SessionEvent};
use crate::capture::domain::photo_capturer::PhotoCapturer;
use crate::capture::session_logger::SessionLogger;
use crate::detection::domain::metrics_extractor::MetricsExtractor;
use crate::detection::domain::viewfinder::Viewfinder;
use crate::shared::frame::Frame;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs a [`CaptureSession`] on a dedicated worker thread.
///
/// Layout: `camera → FrameFeed (latest frame wins) → worker [extract/evaluate/capture] → events`
///
/// The session clock starts when the worker is spawned; the session passed in
/// should therefore start at `Duration::ZERO`.
pub struct ThreadedCaptureSession {
    viewfinder: Viewfinder,
    poll_interval: Duration,
}

impl ThreadedCaptureSession {
    pub fn new(viewfinder: Viewfinder) -> Self {
        Self {
            viewfinder,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// How long the worker waits for a frame before re-checking timeout and cancellation.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn spawn(
        &self,
        session: CaptureSession,
        extractor: Box<dyn MetricsExtractor>,
        capturer: Box<dyn PhotoCapturer>,
        logger: Box<dyn SessionLogger>,
    ) -> (FrameFeed, CaptureSessionHandle) {
        let (feed, frame_rx) = frame_channel();
        let (event_tx, event_rx) = crossbeam_channel::unbounded::<SessionEvent>();
        let cancelled = Arc::new(AtomicBool::new(false));

        let worker = SessionWorker {
            session,
            extractor,
            capturer,
            logger,
            viewfinder: self.viewfinder,
            poll_interval: self.poll_interval,
            frame_rx,
            event_tx,
            cancelled: cancelled.clone(),
            stopped: feed.stopped.clone(),
            dropped: feed.dropped.clone(),
        };
        let handle = std::thread::spawn(move || worker.run());

        let session_handle = CaptureSessionHandle {
            events: event_rx,
            cancelled,
            stopped: feed.stopped.clone(),
            worker: handle,
        };
        (feed, session_handle)
    }
}

/// Producer side of the single-slot frame hand-off.
///
/// Holds at most one pending frame: pushing while a frame is still waiting
/// replaces it, so the worker always evaluates the freshest frame.
#[derive(Clone)]
pub struct FrameFeed {
    tx: Sender<Frame>,
    stale_rx: Receiver<Frame>,
    dropped: Arc<AtomicUsize>,
    stopped: Arc<AtomicBool>,
}

fn frame_channel() -> (FrameFeed, Receiver<Frame>) {
    let (tx, rx) = crossbeam_channel::bounded::<Frame>(1);
    let feed = FrameFeed {
        tx,
        stale_rx: rx.clone(),
        dropped: Arc::new(AtomicUsize::new(0)),
        stopped: Arc::new(AtomicBool::new(false)),
    };
    (feed, rx)
}

impl FrameFeed {
    /// Offers a frame to the worker. Returns `false` once the session no
    /// longer accepts frames.
    pub fn push(&self, frame: Frame) -> bool {
        let mut frame = frame;
        loop {
            if self.stopped.load(Ordering::Acquire) {
                return false;
            }
            match self.tx.try_send(frame) {
                Ok(()) => return true,
                Err(TrySendError::Full(rejected)) => {
                    if self.stale_rx.try_recv().is_ok() {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                    }
                    frame = rejected;
                }
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }
    }

    /// Frames replaced before the worker got to them.
    pub fn dropped_frames(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// UI-side handle: session events, cancellation, and the final session.
pub struct CaptureSessionHandle {
    events: Receiver<SessionEvent>,
    cancelled: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
    worker: JoinHandle<CaptureSession>,
}

impl CaptureSessionHandle {
    pub fn events(&self) -> &Receiver<SessionEvent> {
        &self.events
    }

    /// Stops frame delivery, then asks the worker to finish as cancelled.
    pub fn cancel(&self) {
        self.stopped.store(true, Ordering::Release);
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Waits for the worker and returns the finished session.
    pub fn join(self) -> Result<CaptureSession, Box<dyn std::error::Error>> {
        self.worker
            .join()
            .map_err(|_| "Capture session worker panicked".into())
    }
}

struct SessionWorker {
    session: CaptureSession,
    extractor: Box<dyn MetricsExtractor>,
    capturer: Box<dyn PhotoCapturer>,
    logger: Box<dyn SessionLogger>,
    viewfinder: Viewfinder,
    poll_interval: Duration,
    frame_rx: Receiver<Frame>,
    event_tx: Sender<SessionEvent>,
    cancelled: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
    dropped: Arc<AtomicUsize>,
}

impl SessionWorker {
    fn run(mut self) -> CaptureSession {
        let origin = Instant::now();

        while !self.session.is_finished() {
            if self.cancelled.load(Ordering::Acquire) {
                let events = self.session.cancel();
                self.emit(events);
                break;
            }

            match self.frame_rx.recv_timeout(self.poll_interval) {
                Ok(frame) => self.handle_frame(&frame, origin.elapsed()),
                Err(RecvTimeoutError::Timeout) => {
                    let events = self.session.tick(origin.elapsed());
                    self.emit(events);
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.logger.info("Frame feed closed, cancelling session");
                    let events = self.session.cancel();
                    self.emit(events);
                }
            }
        }

        self.stopped.store(true, Ordering::Release);
        self.logger
            .metric("dropped_frames", self.dropped.load(Ordering::Relaxed) as f64);
        self.logger.summary();
        self.session
    }

    fn handle_frame(&mut self, frame: &Frame, now: Duration) {
        let start = Instant::now();
        let detection = self.extractor.extract(frame, &self.viewfinder);
        self.logger.timing("extract", elapsed_ms(start));
        if let Ok(faces) = &detection {
            self.logger.metric("face_count", faces.len() as f64);
        }

        let start = Instant::now();
        let events = self.session.process_frame(detection, now);
        self.logger.timing("evaluate", elapsed_ms(start));
        self.logger.frame(frame.index(), self.session.guidance());

        let capture_requested = events.contains(&SessionEvent::CaptureRequested);
        self.emit(events);
        if capture_requested {
            self.capture(frame);
        }
    }

    fn capture(&mut self, frame: &Frame) {
        let start = Instant::now();
        let result = self.capturer.capture(frame).map_err(|e| e.to_string());
        self.logger.timing("capture", elapsed_ms(start));
        let events = self.session.complete_capture(result);
        self.emit(events);
    }

    fn emit(&self, events: Vec<SessionEvent>) {
        for event in events {
            // The UI may already be gone; the session still runs to completion.
            let _ = self.event_tx.send(event);
        }
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
