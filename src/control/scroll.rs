//! Scroll mode: index finger scrolls up, index+middle scrolls down

use serde::{Deserialize, Serialize};

use crate::hand::FingerVector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Up,
    Down,
}

/// Stateless per-frame scroll mapping
#[derive(Debug, Clone)]
pub struct ScrollController {
    unit: i32,
}

impl ScrollController {
    pub fn new(unit: i32) -> Self {
        Self { unit }
    }

    /// Direction and wheel delta for this frame, or `None` when idle
    pub fn update(&self, fingers: &FingerVector) -> Option<(ScrollDirection, i32)> {
        if fingers.is_index_only() {
            Some((ScrollDirection::Up, self.unit))
        } else if fingers.is_index_middle() {
            Some((ScrollDirection::Down, -self.unit))
        } else {
            None
        }
    }
}
