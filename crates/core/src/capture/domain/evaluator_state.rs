use std::time::Duration;

use crate::capture::domain::guidance_state::GuidanceState;

/// Per-session evaluator memory, threaded through every evaluation call.
///
/// Timestamps are monotonic offsets on the host's session clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvaluatorState {
    pub guidance: GuidanceState,
    pub stable_hold_count: u32,
    /// Most recent blink, or session start if none was observed yet.
    pub last_blink: Duration,
}

impl EvaluatorState {
    pub const INITIAL_GUIDANCE: GuidanceState = GuidanceState::Misaligned;

    pub fn new(session_start: Duration) -> Self {
        Self {
            guidance: Self::INITIAL_GUIDANCE,
            stable_hold_count: 0,
            last_blink: session_start,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let s = EvaluatorState::new(Duration::from_secs(7));
        assert_eq!(s.guidance, GuidanceState::Misaligned);
        assert_eq!(s.stable_hold_count, 0);
        assert_eq!(s.last_blink, Duration::from_secs(7));
    }
}
