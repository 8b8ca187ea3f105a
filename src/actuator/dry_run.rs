//! Logging actuator for hosts without native effectors

use tracing::info;

use super::{ActuatorError, PointerActuator, ScreenSize, ScrollActuator, VolumeActuator};

/// Logs every command instead of performing it
#[derive(Debug, Clone)]
pub struct DryRunActuator {
    screen: ScreenSize,
    levels: (f64, f64),
}

impl DryRunActuator {
    pub fn new(screen: ScreenSize, levels: (f64, f64)) -> Self {
        Self { screen, levels }
    }
}

impl VolumeActuator for DryRunActuator {
    fn level_range(&self) -> Result<(f64, f64), ActuatorError> {
        Ok(self.levels)
    }

    fn set_level(&mut self, level: f64) -> Result<(), ActuatorError> {
        info!(level, "dry-run: set volume level");
        Ok(())
    }
}

impl PointerActuator for DryRunActuator {
    fn screen_size(&self) -> Result<ScreenSize, ActuatorError> {
        Ok(self.screen)
    }

    fn move_to(&mut self, x: i32, y: i32) -> Result<(), ActuatorError> {
        info!(x, y, "dry-run: move cursor");
        Ok(())
    }

    fn click(&mut self) -> Result<(), ActuatorError> {
        info!("dry-run: click");
        Ok(())
    }
}

impl ScrollActuator for DryRunActuator {
    fn scroll(&mut self, delta: i32) -> Result<(), ActuatorError> {
        info!(delta, "dry-run: scroll");
        Ok(())
    }
}
