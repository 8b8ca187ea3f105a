//! Clamped linear interpolation

use crate::config::{check_range, ConfigError};

/// Maps a source interval linearly onto a target interval
///
/// Inputs outside the source interval clamp to the target endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearMap {
    from: (f64, f64),
    to: (f64, f64),
}

impl LinearMap {
    /// The source interval must be finite and strictly increasing; the
    /// target may run in either direction.
    pub fn new(name: &'static str, from: (f64, f64), to: (f64, f64)) -> Result<Self, ConfigError> {
        check_range(name, from)?;
        if !to.0.is_finite() || !to.1.is_finite() {
            return Err(ConfigError::NonFinite { name });
        }
        Ok(Self { from, to })
    }

    pub fn apply(&self, value: f64) -> f64 {
        let (x0, x1) = self.from;
        let (y0, y1) = self.to;

        if value <= x0 {
            y0
        } else if value >= x1 {
            y1
        } else {
            y0 + (value - x0) * (y1 - y0) / (x1 - x0)
        }
    }

    pub fn target(&self) -> (f64, f64) {
        self.to
    }
}
