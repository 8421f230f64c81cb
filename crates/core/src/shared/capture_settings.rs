use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::domain::capture_session::SessionLimits;
use crate::capture::domain::session_config::{ConfigError, SessionConfig};
use crate::shared::constants::{MAX_VALIDATIONS, SESSION_TIMEOUT_SECS};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no platform config directory available")]
    NoConfigDir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraSide {
    #[default]
    Front,
    Back,
}

impl CameraSide {
    pub const ALL: &[CameraSide] = &[CameraSide::Front, CameraSide::Back];
}

impl std::fmt::Display for CameraSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraSide::Front => write!(f, "front"),
            CameraSide::Back => write!(f, "back"),
        }
    }
}

impl std::str::FromStr for CameraSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "front" => Ok(CameraSide::Front),
            "back" => Ok(CameraSide::Back),
            other => Err(format!("unknown camera side '{other}' (expected front or back)")),
        }
    }
}

/// Anti-spoofing strictness requested by the host; passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AntispoofingLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for AntispoofingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AntispoofingLevel::Low => write!(f, "low"),
            AntispoofingLevel::Medium => write!(f, "medium"),
            AntispoofingLevel::High => write!(f, "high"),
        }
    }
}

/// Host-facing capture configuration, persisted as JSON.
///
/// Evaluator tunables are optional; absent values keep the built-in defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub liveness_required: bool,
    pub auto_capture: bool,
    pub session_timeout_secs: u64,
    /// Failed capture attempts allowed before the session gives up.
    pub max_validations: u32,
    pub camera_side: CameraSide,
    pub allow_manual_camera_side: bool,
    pub antispoofing_level: AntispoofingLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_stable_frames: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blink_timeout_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_tolerance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle_tolerance_degrees: Option<f64>,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            liveness_required: true,
            auto_capture: true,
            session_timeout_secs: SESSION_TIMEOUT_SECS,
            max_validations: MAX_VALIDATIONS,
            camera_side: CameraSide::Front,
            allow_manual_camera_side: false,
            antispoofing_level: AntispoofingLevel::Medium,
            required_stable_frames: None,
            blink_timeout_secs: None,
            position_tolerance: None,
            angle_tolerance_degrees: None,
        }
    }
}

impl CaptureSettings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("FaceGate").join("settings.json"))
    }

    /// Loads the persisted settings, falling back to defaults when missing or unreadable.
    pub fn load() -> Self {
        Self::config_path()
            .and_then(|path| Self::from_file(&path).ok())
            .unwrap_or_default()
    }

    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::config_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(io_err)
    }

    /// Builds the validated evaluator configuration these settings describe.
    pub fn session_config(&self) -> Result<SessionConfig, ConfigError> {
        let mut config = SessionConfig::default()
            .with_liveness(self.liveness_required)
            .with_auto_capture(self.auto_capture);
        if let Some(frames) = self.required_stable_frames {
            config = config.with_required_stable_frames(frames);
        }
        if let Some(secs) = self.blink_timeout_secs {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(ConfigError::ZeroBlinkTimeout);
            }
            let timeout = Duration::try_from_secs_f64(secs)
                .map_err(|_| ConfigError::BlinkTimeoutOutOfRange(secs))?;
            config = config.with_blink_timeout(timeout);
        }
        if let Some(tolerance) = self.position_tolerance {
            config = config.with_position_tolerance(tolerance);
        }
        if let Some(degrees) = self.angle_tolerance_degrees {
            config = config.with_angle_tolerance(degrees);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn limits(&self) -> SessionLimits {
        SessionLimits {
            timeout: Duration::from_secs(self.session_timeout_secs),
            max_validations: self.max_validations,
        }
    }
}
