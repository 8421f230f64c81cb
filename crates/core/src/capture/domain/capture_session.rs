//! Host plumbing around the evaluator: session limits, capture bookkeeping
//! and the events a UI consumes.

use std::time::Duration;

use serde::Serialize;

use crate::capture::domain::capture_evaluator::{self, Evaluation};
use crate::capture::domain::evaluator_state::EvaluatorState;
use crate::capture::domain::guidance_state::{GuidanceState, StateTransition};
use crate::capture::domain::session_config::{ConfigError, SessionConfig};
use crate::capture::domain::target_region::TargetRegion;
use crate::detection::domain::face_metrics::FaceMetrics;
use crate::shared::constants::{MAX_VALIDATIONS, SESSION_TIMEOUT_SECS};

/// Bounds on a whole capture session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionLimits {
    /// Wall time after which the session gives up, measured from its start.
    pub timeout: Duration,
    /// Failed capture attempts tolerated before the session gives up.
    pub max_validations: u32,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(SESSION_TIMEOUT_SECS),
            max_validations: MAX_VALIDATIONS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    Captured,
    TimedOut,
    AttemptsExhausted,
    Cancelled,
}

impl std::fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionOutcome::Captured => write!(f, "captured"),
            SessionOutcome::TimedOut => write!(f, "timed out"),
            SessionOutcome::AttemptsExhausted => write!(f, "attempts exhausted"),
            SessionOutcome::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    StateChanged(StateTransition),
    /// Take the photo now. Answer with [`CaptureSession::complete_capture`].
    CaptureRequested,
    CaptureFailed { attempt: u32, reason: String },
    Finished { outcome: SessionOutcome },
}

/// One guided capture, from first frame to a [`SessionOutcome`].
///
/// Once finished, every further input is ignored and produces no events.
#[derive(Debug)]
pub struct CaptureSession {
    config: SessionConfig,
    limits: SessionLimits,
    target: TargetRegion,
    state: EvaluatorState,
    started_at: Duration,
    capture_in_flight: bool,
    failed_attempts: u32,
    frames_evaluated: usize,
    outcome: Option<SessionOutcome>,
}

impl CaptureSession {
    pub fn new(
        config: SessionConfig,
        limits: SessionLimits,
        target: TargetRegion,
        started_at: Duration,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            limits,
            target,
            state: EvaluatorState::new(started_at),
            started_at,
            capture_in_flight: false,
            failed_attempts: 0,
            frames_evaluated: 0,
            outcome: None,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn limits(&self) -> SessionLimits {
        self.limits
    }

    pub fn target_region(&self) -> &TargetRegion {
        &self.target
    }

    /// Replaces the guide region, e.g. after a viewport resize.
    pub fn set_target_region(&mut self, target: TargetRegion) {
        self.target = target;
    }

    pub fn state(&self) -> EvaluatorState {
        self.state
    }

    pub fn guidance(&self) -> GuidanceState {
        self.state.guidance
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn frames_evaluated(&self) -> usize {
        self.frames_evaluated
    }

    pub fn capture_in_flight(&self) -> bool {
        self.capture_in_flight
    }

    /// Feeds one detection result. A failed detection counts as a frame with no face.
    pub fn process_frame(
        &mut self,
        detection: Result<Vec<FaceMetrics>, Box<dyn std::error::Error>>,
        now: Duration,
    ) -> Vec<SessionEvent> {
        if self.is_finished() {
            return Vec::new();
        }
        if let Some(event) = self.check_timeout(now) {
            return vec![event];
        }

        let faces = detection.unwrap_or_else(|e| {
            log::warn!("Face detection failed, treating frame as empty: {e}");
            Vec::new()
        });

        let evaluation =
            capture_evaluator::evaluate(&faces, self.state, &self.target, &self.config, now);
        self.frames_evaluated += 1;
        let mut events = self.apply(evaluation);

        if evaluation.capture_now {
            if self.capture_in_flight {
                log::debug!("Capture already in flight, ignoring capture signal");
            } else {
                self.capture_in_flight = true;
                events.push(SessionEvent::CaptureRequested);
            }
        }
        events
    }

    /// Reports the result of a capture the host performed.
    pub fn complete_capture(&mut self, result: Result<(), String>) -> Vec<SessionEvent> {
        if self.is_finished() {
            return Vec::new();
        }
        self.capture_in_flight = false;

        match result {
            Ok(()) => {
                let mut events = self.apply(capture_evaluator::capture_succeeded(self.state));
                events.push(self.finish(SessionOutcome::Captured));
                events
            }
            Err(reason) => {
                self.failed_attempts += 1;
                let attempt = self.failed_attempts;
                log::warn!(
                    "Capture attempt {attempt}/{} failed: {reason}",
                    self.limits.max_validations
                );
                let mut events = self.apply(capture_evaluator::capture_failed(self.state));
                events.push(SessionEvent::CaptureFailed { attempt, reason });
                if attempt >= self.limits.max_validations {
                    events.push(self.finish(SessionOutcome::AttemptsExhausted));
                }
                events
            }
        }
    }

    /// Checks the session timeout without a frame.
    pub fn tick(&mut self, now: Duration) -> Vec<SessionEvent> {
        if self.is_finished() {
            return Vec::new();
        }
        self.check_timeout(now).into_iter().collect()
    }

    pub fn cancel(&mut self) -> Vec<SessionEvent> {
        if self.is_finished() {
            return Vec::new();
        }
        vec![self.finish(SessionOutcome::Cancelled)]
    }

    fn apply(&mut self, evaluation: Evaluation) -> Vec<SessionEvent> {
        self.state = evaluation.state;
        match evaluation.transition {
            Some(transition) => {
                log::debug!("Guidance: {} -> {}", transition.from, transition.to);
                vec![SessionEvent::StateChanged(transition)]
            }
            None => Vec::new(),
        }
    }

    fn check_timeout(&mut self, now: Duration) -> Option<SessionEvent> {
        let elapsed = now.saturating_sub(self.started_at);
        (elapsed > self.limits.timeout).then(|| self.finish(SessionOutcome::TimedOut))
    }

    fn finish(&mut self, outcome: SessionOutcome) -> SessionEvent {
        self.capture_in_flight = false;
        self.outcome = Some(outcome);
        log::info!(
            "Capture session finished: {outcome} ({} failed attempts)",
            self.failed_attempts
        );
        SessionEvent::Finished { outcome }
    }
}
