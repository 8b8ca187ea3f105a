//! Cursor mode: index tip drives the pointer, a retracted thumb clicks

use serde::{Deserialize, Serialize};

use crate::actuator::ScreenSize;
use crate::config::ConfigError;
use crate::hand::{FingerVector, HandPose, LandmarkId, Point, PoseError};

use super::mapping::LinearMap;

/// Image-space rectangle mapped onto the full screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlZone {
    pub x_min: i32,
    pub x_max: i32,
    pub y_min: i32,
    pub y_max: i32,
}

impl Default for ControlZone {
    /// Tuned for a 640x480 camera frame
    fn default() -> Self {
        Self {
            x_min: 110,
            x_max: 620,
            y_min: 20,
            y_max: 350,
        }
    }
}

impl ControlZone {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.x_range().and(self.y_range()).map(|_| ())
    }

    fn x_range(&self) -> Result<(f64, f64), ConfigError> {
        let range = (f64::from(self.x_min), f64::from(self.x_max));
        crate::config::check_range("control_zone.x", range).map(|_| range)
    }

    fn y_range(&self) -> Result<(f64, f64), ConfigError> {
        let range = (f64::from(self.y_min), f64::from(self.y_max));
        crate::config::check_range("control_zone.y", range).map(|_| range)
    }
}

/// When a retracted thumb produces a click
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickTrigger {
    /// Every frame the thumb is retracted
    #[default]
    Level,
    /// Only the frame the thumb becomes retracted
    Edge,
}

/// One frame's cursor output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorOutput {
    /// Screen position, snapped to even pixels
    pub target: Point,
    /// Thumb tip position when a click fires this frame
    pub click: Option<Point>,
}

#[derive(Debug, Clone)]
pub struct CursorController {
    zone: ControlZone,
    x_map: LinearMap,
    y_map: LinearMap,
    trigger: ClickTrigger,
    thumb_was_down: bool,
}

impl CursorController {
    pub fn new(
        zone: ControlZone,
        screen: ScreenSize,
        trigger: ClickTrigger,
    ) -> Result<Self, ConfigError> {
        screen.validate()?;
        let x_map = LinearMap::new(
            "control_zone.x",
            zone.x_range()?,
            (0.0, f64::from(screen.width - 1)),
        )?;
        let y_map = LinearMap::new(
            "control_zone.y",
            zone.y_range()?,
            (0.0, f64::from(screen.height - 1)),
        )?;

        Ok(Self {
            zone,
            x_map,
            y_map,
            trigger,
            thumb_was_down: false,
        })
    }

    pub fn zone(&self) -> ControlZone {
        self.zone
    }

    /// Forget click edge history; call when Cursor mode is entered
    pub fn reset(&mut self) {
        self.thumb_was_down = false;
    }

    pub fn update(
        &mut self,
        pose: &HandPose,
        fingers: &FingerVector,
    ) -> Result<CursorOutput, PoseError> {
        pose.require(&[LandmarkId::IndexTip, LandmarkId::ThumbTip])?;
        let tip = pose.point(LandmarkId::IndexTip)?;

        let x = snap_even(self.x_map.apply(f64::from(tip.x)));
        let y = snap_even(self.y_map.apply(f64::from(tip.y)));

        let thumb_down = !fingers.thumb;
        let fires = match self.trigger {
            ClickTrigger::Level => thumb_down,
            ClickTrigger::Edge => thumb_down && !self.thumb_was_down,
        };
        self.thumb_was_down = thumb_down;

        let click = if fires {
            Some(pose.point(LandmarkId::ThumbTip)?)
        } else {
            None
        };

        Ok(CursorOutput {
            target: Point::new(x, y),
            click,
        })
    }
}

/// Truncate to a whole pixel, then down to the nearest even one
fn snap_even(value: f64) -> i32 {
    let pixel = value as i32;
    pixel - pixel % 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::Landmark;

    const OPEN: FingerVector = FingerVector::from_array([true; 5]);
    const THUMB_DOWN: FingerVector = FingerVector::from_array([false, true, true, true, true]);

    fn index_at(x: i32, y: i32) -> HandPose {
        HandPose::new(vec![Landmark::new(4, 0, 0), Landmark::new(8, x, y)]).unwrap()
    }

    fn controller(trigger: ClickTrigger) -> CursorController {
        CursorController::new(ControlZone::default(), ScreenSize::new(1920, 1080), trigger)
            .unwrap()
    }

    #[test]
    fn test_zone_corners_map_to_screen_corners() {
        let mut c = controller(ClickTrigger::Level);
        let zone = ControlZone::default();

        let top_left = c.update(&index_at(zone.x_min, zone.y_min), &OPEN).unwrap();
        assert_eq!(top_left.target, Point::new(0, 0));

        let bottom_right = c.update(&index_at(zone.x_max, zone.y_max), &OPEN).unwrap();
        assert_eq!(bottom_right.target, Point::new(1918, 1078));
    }

    #[test]
    fn test_top_right_corner() {
        let mut c = controller(ClickTrigger::Level);
        let zone = ControlZone::default();
        let out = c.update(&index_at(zone.x_max, zone.y_min), &OPEN).unwrap();
        assert_eq!(out.target, Point::new(1918, 0));
    }

    #[test]
    fn test_outside_zone_clamps() {
        let mut c = controller(ClickTrigger::Level);
        let out = c.update(&index_at(0, 479), &OPEN).unwrap();
        assert_eq!(out.target, Point::new(0, 1078));
    }

    #[test]
    fn test_targets_are_even() {
        let mut c = controller(ClickTrigger::Level);
        for x in (110..=620).step_by(7) {
            let out = c.update(&index_at(x, 200), &OPEN).unwrap();
            assert_eq!(out.target.x % 2, 0);
            assert_eq!(out.target.y % 2, 0);
        }
    }

    #[test]
    fn test_level_trigger_clicks_every_frame() {
        let mut c = controller(ClickTrigger::Level);
        let pose = index_at(300, 200);
        for _ in 0..3 {
            let out = c.update(&pose, &THUMB_DOWN).unwrap();
            assert_eq!(out.click, Some(Point::new(0, 0)));
        }
        assert_eq!(c.update(&pose, &OPEN).unwrap().click, None);
    }

    #[test]
    fn test_edge_trigger_clicks_once_per_press() {
        let mut c = controller(ClickTrigger::Edge);
        let pose = index_at(300, 200);

        assert!(c.update(&pose, &THUMB_DOWN).unwrap().click.is_some());
        assert!(c.update(&pose, &THUMB_DOWN).unwrap().click.is_none());
        assert!(c.update(&pose, &OPEN).unwrap().click.is_none());
        assert!(c.update(&pose, &THUMB_DOWN).unwrap().click.is_some());

        c.reset();
        assert!(c.update(&pose, &THUMB_DOWN).unwrap().click.is_some());
    }

    #[test]
    fn test_invalid_zone_rejected() {
        let zone = ControlZone {
            x_min: 300,
            x_max: 300,
            ..ControlZone::default()
        };
        assert!(zone.validate().is_err());
        assert!(CursorController::new(zone, ScreenSize::new(1920, 1080), ClickTrigger::Level)
            .is_err());
    }
}
