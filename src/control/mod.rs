//! Per-mode continuous controllers
//!
//! Each controller turns the current hand pose into actuator values while
//! its mode is active. None of them decide mode changes.

mod cursor;
mod mapping;
mod scroll;
mod volume;

pub use cursor::{ClickTrigger, ControlZone, CursorController, CursorOutput};
pub use mapping::LinearMap;
pub use scroll::{ScrollController, ScrollDirection};
pub use volume::{VolumeController, VolumeReading};
