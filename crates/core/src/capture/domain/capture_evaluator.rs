//! Frame-by-frame capture gate.
//!
//! Each frame is checked against an ordered table of guards; the first guard
//! that trips decides the guidance state and resets the stability counter.
//! A frame that trips none is a stable hold, and enough consecutive holds
//! fire the one-shot capture signal.
//!
//! Evaluation is a pure function of (faces, state, target, config, now): all
//! memory lives in the [`EvaluatorState`] passed in and returned.

use std::time::Duration;

use crate::capture::domain::evaluator_state::EvaluatorState;
use crate::capture::domain::guidance_state::{GuidanceState, StateTransition};
use crate::capture::domain::session_config::SessionConfig;
use crate::capture::domain::target_region::TargetRegion;
use crate::detection::domain::face_metrics::FaceMetrics;
use crate::shared::rect::Rect;

/// Result of evaluating one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Evaluation {
    pub state: EvaluatorState,
    /// One-shot instruction to take the photo now.
    pub capture_now: bool,
    /// Set only when the guidance state changed.
    pub transition: Option<StateTransition>,
}

impl Evaluation {
    fn between(previous: &EvaluatorState, state: EvaluatorState, capture_now: bool) -> Self {
        let transition = (previous.guidance != state.guidance).then_some(StateTransition {
            from: previous.guidance,
            to: state.guidance,
        });
        Self {
            state,
            capture_now,
            transition,
        }
    }
}

/// Everything a guard may look at for the current frame.
struct FrameContext<'a> {
    faces: &'a [FaceMetrics],
    /// The face under evaluation; only set when exactly one was detected.
    face: Option<&'a FaceMetrics>,
    target: Rect,
    config: &'a SessionConfig,
    now: Duration,
    /// `now` if this frame shows a blink, otherwise the last recorded blink.
    blink_reference: Duration,
}

impl<'a> FrameContext<'a> {
    fn new(
        faces: &'a [FaceMetrics],
        state: &EvaluatorState,
        target: &TargetRegion,
        config: &'a SessionConfig,
        now: Duration,
    ) -> Self {
        let face = match faces {
            [face] => Some(face),
            _ => None,
        };
        let blinked = config.liveness_required
            && face.is_some_and(|f| f.eyes_closed_below(config.eye_closure_threshold));
        Self {
            faces,
            face,
            target: target.rect(),
            config,
            now,
            blink_reference: if blinked { now } else { state.last_blink },
        }
    }

    fn ideal_height(&self) -> f64 {
        self.target.height * self.config.target_height_fraction
    }

    fn face_height_is(&self, check: impl Fn(f64, f64) -> bool) -> bool {
        let ideal = self.ideal_height();
        self.face.is_some_and(|f| check(f.region.height, ideal))
    }

    /// Face-center offset from the target center, normalized by target size.
    fn offset(&self) -> Option<(f64, f64)> {
        let face = self.face?;
        let dx = (face.region.mid_x() - self.target.mid_x()) / self.target.width;
        let dy = (face.region.mid_y() - self.target.mid_y()) / self.target.height;
        Some((dx, dy))
    }

    fn offset_is(&self, check: impl Fn(f64, f64, f64) -> bool) -> bool {
        let tol = self.config.position_tolerance;
        self.offset().is_some_and(|(dx, dy)| check(dx, dy, tol))
    }
}

type Guard = fn(&FrameContext<'_>) -> bool;

/// Failure conditions in priority order; the first match wins.
const GUARDS: [(GuidanceState, Guard); 10] = [
    (GuidanceState::NoFace, no_face),
    (GuidanceState::TooManyFaces, too_many_faces),
    (GuidanceState::TooFar, too_far),
    (GuidanceState::TooClose, too_close),
    (GuidanceState::OffLeft, off_left),
    (GuidanceState::OffRight, off_right),
    (GuidanceState::OffUp, off_up),
    (GuidanceState::OffDown, off_down),
    (GuidanceState::Misaligned, misaligned),
    (GuidanceState::AwaitingBlink, awaiting_blink),
];

fn no_face(ctx: &FrameContext<'_>) -> bool {
    ctx.faces.is_empty()
}

fn too_many_faces(ctx: &FrameContext<'_>) -> bool {
    ctx.faces.len() > 1
}

fn too_far(ctx: &FrameContext<'_>) -> bool {
    let ratio = ctx.config.min_size_ratio;
    ctx.face_height_is(|h, ideal| h < ideal * ratio)
}

fn too_close(ctx: &FrameContext<'_>) -> bool {
    let ratio = ctx.config.max_size_ratio;
    ctx.face_height_is(|h, ideal| h > ideal * ratio)
}

fn off_left(ctx: &FrameContext<'_>) -> bool {
    ctx.offset_is(|dx, _, tol| dx < -tol)
}

fn off_right(ctx: &FrameContext<'_>) -> bool {
    ctx.offset_is(|dx, _, tol| dx > tol)
}

fn off_up(ctx: &FrameContext<'_>) -> bool {
    ctx.offset_is(|_, dy, tol| dy < -tol)
}

fn off_down(ctx: &FrameContext<'_>) -> bool {
    ctx.offset_is(|_, dy, tol| dy > tol)
}

/// An absent angle counts as 0°, i.e. aligned.
fn misaligned(ctx: &FrameContext<'_>) -> bool {
    let tol = ctx.config.angle_tolerance_degrees;
    let exceeds = |angle: Option<f64>| angle.unwrap_or(0.0).to_degrees().abs() > tol;
    ctx.face.is_some_and(|f| exceeds(f.yaw) || exceeds(f.roll))
}

fn awaiting_blink(ctx: &FrameContext<'_>) -> bool {
    ctx.config.liveness_required
        && ctx.now.saturating_sub(ctx.blink_reference) > ctx.config.blink_timeout
}

/// Evaluates one frame of face metrics.
///
/// `Captured` is terminal: the state is returned unchanged and no signal fires.
pub fn evaluate(
    faces: &[FaceMetrics],
    state: EvaluatorState,
    target: &TargetRegion,
    config: &SessionConfig,
    now: Duration,
) -> Evaluation {
    debug_assert!(config.validate().is_ok(), "session config must be valid");
    debug_assert!(
        faces.iter().all(|f| f.region.is_well_formed()),
        "face regions must have finite non-negative dimensions"
    );

    if state.guidance.is_terminal() {
        return Evaluation::between(&state, state, false);
    }

    let ctx = FrameContext::new(faces, &state, target, config, now);
    let tripped = GUARDS
        .iter()
        .find(|(_, guard)| guard(&ctx))
        .map(|(guidance, _)| *guidance);

    if let Some(guidance) = tripped {
        let next = EvaluatorState {
            guidance,
            stable_hold_count: 0,
            last_blink: state.last_blink,
        };
        return Evaluation::between(&state, next, false);
    }

    let held = state.stable_hold_count.saturating_add(1);
    let capture_now = config.auto_capture_enabled && held >= config.required_stable_frames;
    let next = EvaluatorState {
        guidance: GuidanceState::HoldSteady,
        stable_hold_count: if capture_now { 0 } else { held },
        last_blink: ctx.blink_reference,
    };
    Evaluation::between(&state, next, capture_now)
}

/// The photo was taken: the session ends in `Captured`.
pub fn capture_succeeded(state: EvaluatorState) -> Evaluation {
    let next = EvaluatorState {
        guidance: GuidanceState::Captured,
        stable_hold_count: 0,
        ..state
    };
    Evaluation::between(&state, next, false)
}

/// The photo could not be taken: stay in `HoldSteady` and rebuild stability from zero.
pub fn capture_failed(state: EvaluatorState) -> Evaluation {
    if state.guidance.is_terminal() {
        return Evaluation::between(&state, state, false);
    }
    let next = EvaluatorState {
        guidance: GuidanceState::HoldSteady,
        stable_hold_count: 0,
        ..state
    };
    Evaluation::between(&state, next, false)
}
