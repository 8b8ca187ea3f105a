//! Annotation requests for hosts that draw feedback on the video frame

use serde::{Deserialize, Serialize};

use crate::control::{ControlZone, ScrollDirection};
use crate::hand::Point;
use crate::state::Mode;

/// Something the host may draw for the current frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Overlay {
    /// Name of the active mode
    ModeLabel { mode: Mode },
    /// Scroll direction indicator
    ScrollIndicator { direction: ScrollDirection },
    /// Line between thumb and index tips with its midpoint
    PinchLine {
        thumb: Point,
        index: Point,
        midpoint: Point,
    },
    /// Volume bar
    VolumeBar { level: f64, percent: u8 },
    /// The image-space rectangle mapped onto the screen
    ControlZone { zone: ControlZone },
    /// Thumb tip when a click fired
    ClickMarker { at: Point },
}
