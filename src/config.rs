//! Configuration loading and management

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::actuator::{BackendKind, ScreenSize};
use crate::control::{ClickTrigger, ControlZone};

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// Where gesture settings were read from (may not exist)
    pub settings_path: PathBuf,

    /// Calibration constants for the gesture core
    pub settings: GestureSettings,
}

impl Config {
    /// Load configuration from environment, settings file and defaults
    pub fn load() -> Result<Self> {
        let home = std::env::var("HOME").context("HOME is not set")?;
        let data_dir = PathBuf::from(&home)
            .join(".local")
            .join("share")
            .join("gesture-control");

        let socket_path = std::env::var_os("GESTURE_CONTROL_SOCKET")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("daemon.sock"));

        let settings_path = std::env::var_os("GESTURE_CONTROL_SETTINGS")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("settings.json"));

        let settings = GestureSettings::load(&settings_path)?;
        settings.validate()?;

        Ok(Self {
            socket_path,
            data_dir,
            settings_path,
            settings,
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("failed to create {}", self.data_dir.display()))?;
        Ok(())
    }
}

/// Errors in gesture settings, raised once at setup
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} range [{min}, {max}] must be increasing")]
    DegenerateRange {
        name: &'static str,
        min: f64,
        max: f64,
    },

    #[error("{name} contains a non-finite value")]
    NonFinite { name: &'static str },

    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: i32 },

    #[error("screen size {width}x{height} has no pixels")]
    EmptyScreen { width: u32, height: u32 },

    #[error("failed to read settings from {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings in {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Check that `(min, max)` is finite and strictly increasing
pub fn check_range(name: &'static str, (min, max): (f64, f64)) -> Result<(), ConfigError> {
    if !min.is_finite() || !max.is_finite() {
        return Err(ConfigError::NonFinite { name });
    }
    if min >= max {
        return Err(ConfigError::DegenerateRange { name, min, max });
    }
    Ok(())
}

/// Calibration constants supplied by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureSettings {
    /// Thumb-to-index pixel distance mapped to minimum and maximum volume
    pub distance_range: (f64, f64),

    /// Volume levels to map onto; the device-reported range when unset
    pub volume_levels: Option<(f64, f64)>,

    /// Image-space rectangle mapped onto the whole screen
    pub control_zone: ControlZone,

    /// Scroll wheel magnitude per frame
    pub scroll_unit: i32,

    /// When Cursor mode issues clicks
    pub click_trigger: ClickTrigger,

    /// Actuator backend selection
    pub backend: BackendKind,

    /// Screen size reported by the dry-run backend
    pub dry_run_screen: ScreenSize,

    /// Volume level range reported by the dry-run backend
    pub dry_run_levels: (f64, f64),
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            distance_range: (50.0, 200.0),
            volume_levels: None,
            control_zone: ControlZone::default(),
            scroll_unit: 300,
            click_trigger: ClickTrigger::default(),
            backend: BackendKind::default(),
            dry_run_screen: ScreenSize::new(1920, 1080),
            dry_run_levels: (-63.0, 0.0),
        }
    }
}

impl GestureSettings {
    /// Read settings from a JSON file, falling back to defaults if absent
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;

        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Reject settings that would make a mapping degenerate
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("distance_range", self.distance_range)?;
        if let Some(levels) = self.volume_levels {
            check_range("volume_levels", levels)?;
        }
        self.control_zone.validate()?;
        if self.scroll_unit <= 0 {
            return Err(ConfigError::NonPositive {
                name: "scroll_unit",
                value: self.scroll_unit,
            });
        }
        self.dry_run_screen.validate()?;
        check_range("dry_run_levels", self.dry_run_levels)?;
        Ok(())
    }
}
