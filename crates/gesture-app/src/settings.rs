//! Layered settings
//!
//! Built-in defaults, then an optional TOML file, then `RADAR_*` environment
//! variables (`__` separates nested keys, e.g. `RADAR_DETECTION__HOLD_CYCLES`).

use console::BoardInfo;
use detection::{DetectionConfig, DetectionConfigError};
use frame_acquisition::{AcquisitionError, FrameGeometry, SimulationConfig};
use gesture_engine::EnergyConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::Level;

/// Settings file read when no path is given
pub const DEFAULT_SETTINGS_PATH: &str = "radar-gestures.toml";

/// Settings load and validation errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid radar settings: {0}")]
    Radar(#[from] AcquisitionError),

    #[error("Invalid detection settings: {0}")]
    Detection(#[from] DetectionConfigError),

    #[error("Unknown log level '{0}'")]
    LogLevel(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Radar front end and buffer service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarSettings {
    pub geometry: FrameGeometry,
    /// Frame period in microseconds (default: 30045, ~33 Hz)
    pub frame_period_us: u64,
    /// Frames the buffer service can hold
    pub buffer_frames: usize,
    pub simulation: SimulationConfig,
}

impl Default for RadarSettings {
    fn default() -> Self {
        Self {
            geometry: FrameGeometry::default(),
            frame_period_us: 30_045,
            buffer_frames: 3,
            simulation: SimulationConfig::default(),
        }
    }
}

impl RadarSettings {
    pub fn frame_period(&self) -> Duration {
        Duration::from_micros(self.frame_period_us)
    }
}

/// Diagnostic output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Full application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub radar: RadarSettings,
    pub detection: DetectionConfig,
    pub classifier: EnergyConfig,
    pub board: BoardInfo,
    /// Heartbeat LED toggle period (default: 1000 ms)
    pub heartbeat_ms: u64,
    /// Verbose gesture events at startup
    pub verbose: bool,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            radar: RadarSettings::default(),
            detection: DetectionConfig::default(),
            classifier: EnergyConfig::default(),
            board: BoardInfo::default(),
            heartbeat_ms: 1000,
            verbose: false,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl Settings {
    /// Load from `path` (optional file) and the process environment
    pub fn load(path: &str) -> Result<Self, SettingsError> {
        Self::from_sources(path, environment())
    }

    fn from_sources(path: &str, env: config::Environment) -> Result<Self, SettingsError> {
        let settings: Settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::with_name(path).required(false))
            .add_source(env)
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the pipeline cannot start with
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.radar.geometry.validate()?;
        self.detection.validate()?;
        if self.radar.frame_period_us == 0 {
            return Err(SettingsError::Zero("radar.frame_period_us"));
        }
        if self.radar.buffer_frames == 0 {
            return Err(SettingsError::Zero("radar.buffer_frames"));
        }
        if self.heartbeat_ms == 0 {
            return Err(SettingsError::Zero("heartbeat_ms"));
        }
        self.level()?;
        Ok(())
    }

    pub fn level(&self) -> Result<Level, SettingsError> {
        Level::from_str(&self.log_level).map_err(|_| SettingsError::LogLevel(self.log_level.clone()))
    }

    pub fn heartbeat_period(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms)
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("RADAR")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
