use serde::Serialize;

/// Discrete guidance shown to the subject, one per evaluated frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceState {
    NoFace,
    TooManyFaces,
    TooFar,
    TooClose,
    OffLeft,
    OffRight,
    OffUp,
    OffDown,
    Misaligned,
    AwaitingBlink,
    HoldSteady,
    Captured,
}

/// Color family used to tint guidance text and the oval border.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuidanceColor {
    Warning,
    Success,
}

impl GuidanceState {
    pub const ALL: &[GuidanceState] = &[
        GuidanceState::NoFace,
        GuidanceState::TooManyFaces,
        GuidanceState::TooFar,
        GuidanceState::TooClose,
        GuidanceState::OffLeft,
        GuidanceState::OffRight,
        GuidanceState::OffUp,
        GuidanceState::OffDown,
        GuidanceState::Misaligned,
        GuidanceState::AwaitingBlink,
        GuidanceState::HoldSteady,
        GuidanceState::Captured,
    ];

    /// Localization key for the guidance message.
    pub fn message_key(self) -> &'static str {
        match self {
            GuidanceState::NoFace => "NBM_FACE_NOFACE",
            GuidanceState::TooManyFaces => "NBM_FACE_MANY",
            GuidanceState::TooFar => "NBM_FACE_FAR",
            GuidanceState::TooClose => "NBM_FACE_CLOSE",
            GuidanceState::OffLeft => "NBM_FACE_LEFT",
            GuidanceState::OffRight => "NBM_FACE_RIGHT",
            GuidanceState::OffUp => "NBM_FACE_UP",
            GuidanceState::OffDown => "NBM_FACE_DOWN",
            GuidanceState::Misaligned => "NBM_FACE_ALIGN",
            GuidanceState::AwaitingBlink => "NBM_FACE_BLINK",
            GuidanceState::HoldSteady => "NBM_FACE_HOLD",
            GuidanceState::Captured => "NBM_OK",
        }
    }

    pub fn color(self) -> GuidanceColor {
        match self {
            GuidanceState::HoldSteady | GuidanceState::Captured => GuidanceColor::Success,
            _ => GuidanceColor::Warning,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == GuidanceState::Captured
    }
}

impl std::fmt::Display for GuidanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GuidanceState::NoFace => "no face",
            GuidanceState::TooManyFaces => "too many faces",
            GuidanceState::TooFar => "too far",
            GuidanceState::TooClose => "too close",
            GuidanceState::OffLeft => "off left",
            GuidanceState::OffRight => "off right",
            GuidanceState::OffUp => "off up",
            GuidanceState::OffDown => "off down",
            GuidanceState::Misaligned => "misaligned",
            GuidanceState::AwaitingBlink => "awaiting blink",
            GuidanceState::HoldSteady => "hold steady",
            GuidanceState::Captured => "captured",
        };
        write!(f, "{name}")
    }
}

/// A change of guidance state, emitted only when the state actually differs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StateTransition {
    pub from: GuidanceState,
    pub to: GuidanceState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    #[case::no_face(GuidanceState::NoFace, "NBM_FACE_NOFACE")]
    #[case::many(GuidanceState::TooManyFaces, "NBM_FACE_MANY")]
    #[case::far(GuidanceState::TooFar, "NBM_FACE_FAR")]
    #[case::close(GuidanceState::TooClose, "NBM_FACE_CLOSE")]
    #[case::left(GuidanceState::OffLeft, "NBM_FACE_LEFT")]
    #[case::right(GuidanceState::OffRight, "NBM_FACE_RIGHT")]
    #[case::up(GuidanceState::OffUp, "NBM_FACE_UP")]
    #[case::down(GuidanceState::OffDown, "NBM_FACE_DOWN")]
    #[case::align(GuidanceState::Misaligned, "NBM_FACE_ALIGN")]
    #[case::blink(GuidanceState::AwaitingBlink, "NBM_FACE_BLINK")]
    #[case::hold(GuidanceState::HoldSteady, "NBM_FACE_HOLD")]
    #[case::captured(GuidanceState::Captured, "NBM_OK")]
    fn test_message_key(#[case] state: GuidanceState, #[case] key: &str) {
        assert_eq!(state.message_key(), key);
    }

    #[test]
    fn test_message_keys_are_unique() {
        let keys: HashSet<_> = GuidanceState::ALL.iter().map(|s| s.message_key()).collect();
        assert_eq!(keys.len(), GuidanceState::ALL.len());
    }

    #[test]
    fn test_only_hold_and_captured_are_success() {
        for state in GuidanceState::ALL {
            let expected = matches!(state, GuidanceState::HoldSteady | GuidanceState::Captured);
            assert_eq!(state.color() == GuidanceColor::Success, expected, "{state}");
        }
    }

    #[test]
    fn test_captured_is_terminal() {
        assert!(GuidanceState::Captured.is_terminal());
        assert!(!GuidanceState::HoldSteady.is_terminal());
    }

    #[test]
    fn test_serializes_snake_case() {
        let json = serde_json::to_string(&GuidanceState::AwaitingBlink).unwrap();
        assert_eq!(json, "\"awaiting_blink\"");
    }
}
