//! Actuator module for OS-level effects
//!
//! The gesture core only issues `Command`s; the traits here are the seam
//! to whatever performs them. Each actuator is set up independently so a
//! missing audio device does not take pointer control down with it.

mod dry_run;
#[cfg(target_os = "macos")]
mod macos;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{ConfigError, GestureSettings};

pub use dry_run::DryRunActuator;

/// Commands issued by the controllers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Set output volume in the actuator's native units
    SetVolumeLevel { level: f64 },
    /// Scroll the wheel; positive is up
    Scroll { delta: i32 },
    /// Move the pointer to absolute screen coordinates
    MoveCursor { x: i32, y: i32 },
    /// Left click at the current pointer position
    Click,
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::SetVolumeLevel { level } => write!(f, "SetVolumeLevel({:.2})", level),
            Command::Scroll { delta } => write!(f, "Scroll({})", delta),
            Command::MoveCursor { x, y } => write!(f, "MoveCursor({}, {})", x, y),
            Command::Click => write!(f, "Click()"),
        }
    }
}

/// Screen resolution in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl ScreenSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyScreen {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Errors raised by actuators
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActuatorError {
    #[error("{actuator} actuator unavailable: {reason}")]
    Unavailable {
        actuator: &'static str,
        reason: String,
    },

    #[error("{actuator} actuator call failed: {reason}")]
    CallFailed {
        actuator: &'static str,
        reason: String,
    },
}

impl ActuatorError {
    pub fn actuator(&self) -> &'static str {
        match self {
            ActuatorError::Unavailable { actuator, .. } => actuator,
            ActuatorError::CallFailed { actuator, .. } => actuator,
        }
    }
}

/// System output volume
pub trait VolumeActuator: Send {
    /// Native `(min, max)` level range reported by the device
    fn level_range(&self) -> Result<(f64, f64), ActuatorError>;

    fn set_level(&mut self, level: f64) -> Result<(), ActuatorError>;
}

/// Pointer movement and clicking
pub trait PointerActuator: Send {
    fn screen_size(&self) -> Result<ScreenSize, ActuatorError>;

    fn move_to(&mut self, x: i32, y: i32) -> Result<(), ActuatorError>;

    fn click(&mut self) -> Result<(), ActuatorError>;
}

/// Scroll wheel emulation
pub trait ScrollActuator: Send {
    fn scroll(&mut self, delta: i32) -> Result<(), ActuatorError>;
}

/// Which actuator implementation to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Native backend where one exists, dry-run elsewhere
    #[default]
    Auto,
    /// Log every command instead of performing it
    DryRun,
}

/// The set of actuators handed to the engine
///
/// Each slot holds either a working actuator or the reason it could not
/// be set up.
pub struct Actuators {
    pub volume: Result<Box<dyn VolumeActuator>, ActuatorError>,
    pub pointer: Result<Box<dyn PointerActuator>, ActuatorError>,
    pub scroll: Result<Box<dyn ScrollActuator>, ActuatorError>,
}

impl Actuators {
    /// Every slot backed by the dry-run actuator
    pub fn dry_run(settings: &GestureSettings) -> Self {
        let actuator = DryRunActuator::new(settings.dry_run_screen, settings.dry_run_levels);
        Self {
            volume: Ok(Box::new(actuator.clone())),
            pointer: Ok(Box::new(actuator.clone())),
            scroll: Ok(Box::new(actuator)),
        }
    }

    /// Build the backend selected in `settings`
    pub fn from_settings(settings: &GestureSettings) -> Self {
        match settings.backend {
            BackendKind::DryRun => {
                info!("using dry-run actuators");
                Self::dry_run(settings)
            }
            BackendKind::Auto => Self::native(settings),
        }
    }

    #[cfg(target_os = "macos")]
    fn native(_settings: &GestureSettings) -> Self {
        info!("using CoreGraphics actuators");
        Self {
            volume: macos::OsaVolume::new().map(|v| Box::new(v) as Box<dyn VolumeActuator>),
            pointer: Ok(Box::new(macos::CgPointer::new())),
            scroll: Ok(Box::new(macos::CgPointer::default())),
        }
    }

    #[cfg(not(target_os = "macos"))]
    fn native(settings: &GestureSettings) -> Self {
        tracing::warn!("no native actuators for this platform, falling back to dry-run");
        Self::dry_run(settings)
    }
}
