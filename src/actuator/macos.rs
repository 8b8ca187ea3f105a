//! Native macOS actuators
//!
//! Pointer and scroll events are posted through CoreGraphics at the HID
//! tap location. Volume goes through `osascript`, which only exposes a
//! 0-100 output scale and runs on its own thread.

use std::path::Path;
use std::process::Command;
use std::sync::mpsc;
use std::thread;

use core_graphics::display::CGDisplay;
use core_graphics::event::{
    CGEvent, CGEventTapLocation, CGEventType, CGMouseButton, ScrollEventUnit,
};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use core_graphics::geometry::CGPoint;
use tracing::{debug, info, warn};

use super::{ActuatorError, PointerActuator, ScreenSize, ScrollActuator, VolumeActuator};

const OSASCRIPT: &str = "/usr/bin/osascript";

fn event_source(actuator: &'static str) -> Result<CGEventSource, ActuatorError> {
    CGEventSource::new(CGEventSourceStateID::HIDSystemState).map_err(|_| {
        ActuatorError::CallFailed {
            actuator,
            reason: "failed to create event source".to_string(),
        }
    })
}

fn call_failed(actuator: &'static str, what: &str) -> ActuatorError {
    ActuatorError::CallFailed {
        actuator,
        reason: format!("failed to create {} event", what),
    }
}

/// Mouse movement, clicks and scroll wheel via CGEvent
pub struct CgPointer {
    /// Last position we moved to; clicks land here
    position: Option<CGPoint>,
}

impl CgPointer {
    pub fn new() -> Self {
        Self { position: None }
    }

    fn current_position(&self) -> Result<CGPoint, ActuatorError> {
        if let Some(position) = self.position {
            return Ok(position);
        }
        let event = CGEvent::new(event_source("pointer")?).map_err(|_| call_failed("pointer", "position query"))?;
        Ok(event.location())
    }

    fn post_mouse(&self, kind: CGEventType, at: CGPoint) -> Result<(), ActuatorError> {
        let event = CGEvent::new_mouse_event(event_source("pointer")?, kind, at, CGMouseButton::Left)
            .map_err(|_| call_failed("pointer", "mouse"))?;
        event.post(CGEventTapLocation::HID);
        Ok(())
    }
}

impl Default for CgPointer {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerActuator for CgPointer {
    fn screen_size(&self) -> Result<ScreenSize, ActuatorError> {
        let display = CGDisplay::main();
        let size = ScreenSize::new(display.pixels_wide() as u32, display.pixels_high() as u32);
        size.validate().map_err(|e| ActuatorError::Unavailable {
            actuator: "pointer",
            reason: e.to_string(),
        })?;
        Ok(size)
    }

    fn move_to(&mut self, x: i32, y: i32) -> Result<(), ActuatorError> {
        let point = CGPoint::new(f64::from(x), f64::from(y));
        self.post_mouse(CGEventType::MouseMoved, point)?;
        self.position = Some(point);
        Ok(())
    }

    fn click(&mut self) -> Result<(), ActuatorError> {
        let at = self.current_position()?;
        self.post_mouse(CGEventType::LeftMouseDown, at)?;
        self.post_mouse(CGEventType::LeftMouseUp, at)?;
        debug!(x = at.x, y = at.y, "posted click");
        Ok(())
    }
}

impl ScrollActuator for CgPointer {
    fn scroll(&mut self, delta: i32) -> Result<(), ActuatorError> {
        let event = CGEvent::new_scroll_event(
            event_source("scroll")?,
            ScrollEventUnit::PIXEL,
            1,
            delta,
            0,
            0,
        )
        .map_err(|_| call_failed("scroll", "scroll"))?;
        event.post(CGEventTapLocation::HID);
        Ok(())
    }
}

/// Output volume via AppleScript's 0-100 scale
///
/// Levels are handed to a dedicated thread; when calls back up, only the
/// newest pending level is applied.
pub struct OsaVolume {
    level_tx: mpsc::Sender<i64>,
}

impl OsaVolume {
    pub fn new() -> Result<Self, ActuatorError> {
        if !Path::new(OSASCRIPT).exists() {
            return Err(ActuatorError::Unavailable {
                actuator: "volume",
                reason: format!("{} not found", OSASCRIPT),
            });
        }

        let (level_tx, level_rx) = mpsc::channel();
        thread::Builder::new()
            .name("volume-setter".to_string())
            .spawn(move || {
                info!("volume setter thread started");
                apply_latest(level_rx, set_output_volume);
                info!("volume setter thread stopped");
            })
            .map_err(|e| ActuatorError::Unavailable {
                actuator: "volume",
                reason: format!("failed to spawn volume thread: {}", e),
            })?;

        Ok(Self { level_tx })
    }
}

impl VolumeActuator for OsaVolume {
    fn level_range(&self) -> Result<(f64, f64), ActuatorError> {
        Ok((0.0, 100.0))
    }

    fn set_level(&mut self, level: f64) -> Result<(), ActuatorError> {
        self.level_tx
            .send(level.round() as i64)
            .map_err(|_| ActuatorError::CallFailed {
                actuator: "volume",
                reason: "volume thread stopped".to_string(),
            })
    }
}

/// Apply levels until every sender is gone, skipping superseded ones
fn apply_latest<F>(level_rx: mpsc::Receiver<i64>, mut apply: F)
where
    F: FnMut(i64) -> Result<(), String>,
{
    while let Ok(mut level) = level_rx.recv() {
        while let Ok(newer) = level_rx.try_recv() {
            level = newer;
        }
        if let Err(reason) = apply(level) {
            warn!(level, %reason, "failed to set output volume");
        }
    }
}

fn set_output_volume(level: i64) -> Result<(), String> {
    let script = format!("set volume output volume {}", level);
    let status = Command::new(OSASCRIPT)
        .args(["-e", &script])
        .status()
        .map_err(|e| e.to_string())?;

    if !status.success() {
        return Err(format!("osascript exited with {}", status));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_starts_without_position() {
        assert!(CgPointer::default().position.is_none());
    }

    #[test]
    fn test_only_newest_pending_level_is_applied() {
        let (tx, rx) = mpsc::channel();
        for level in [10, 20, 30] {
            tx.send(level).unwrap();
        }
        drop(tx);

        let mut applied = Vec::new();
        apply_latest(rx, |level| {
            applied.push(level);
            Ok(())
        });
        assert_eq!(applied, vec![30]);
    }

    #[test]
    fn test_failed_level_does_not_stop_the_setter() {
        let (tx, rx) = mpsc::channel();
        let worker = thread::spawn(move || {
            let mut applied = Vec::new();
            apply_latest(rx, |level| {
                applied.push(level);
                if level < 0 {
                    Err("rejected".to_string())
                } else {
                    Ok(())
                }
            });
            applied
        });

        tx.send(-1).unwrap();
        thread::sleep(std::time::Duration::from_millis(50));
        tx.send(40).unwrap();
        drop(tx);

        let applied = worker.join().unwrap();
        assert_eq!(applied.last(), Some(&40));
    }

    #[test]
    fn test_set_level_returns_without_waiting() {
        let (level_tx, level_rx) = mpsc::channel();
        let mut volume = OsaVolume { level_tx };
        volume.set_level(42.4).unwrap();
        assert_eq!(level_rx.try_recv(), Ok(42));

        drop(level_rx);
        assert!(matches!(
            volume.set_level(10.0),
            Err(ActuatorError::CallFailed { actuator: "volume", .. })
        ));
    }
}
