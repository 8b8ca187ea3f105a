//! Volume mode: thumb-to-index pinch distance sets the output level

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::hand::{HandPose, LandmarkId, Point, PoseError};

use super::mapping::LinearMap;

/// One frame's volume measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeReading {
    pub thumb: Point,
    pub index: Point,
    pub midpoint: Point,
    /// Pixel distance between the two tips
    pub distance: f64,
    /// Level in the actuator's native units
    pub level: f64,
    /// Display-only percentage of the level range
    pub percent: u8,
}

#[derive(Debug, Clone)]
pub struct VolumeController {
    distance_to_level: LinearMap,
    level_to_percent: LinearMap,
}

impl VolumeController {
    /// `distance_range` is the pinched..spread calibration in pixels,
    /// `levels` the actuator's native minimum and maximum.
    pub fn new(distance_range: (f64, f64), levels: (f64, f64)) -> Result<Self, ConfigError> {
        Ok(Self {
            distance_to_level: LinearMap::new("distance_range", distance_range, levels)?,
            level_to_percent: LinearMap::new("volume_levels", levels, (0.0, 100.0))?,
        })
    }

    pub fn levels(&self) -> (f64, f64) {
        self.distance_to_level.target()
    }

    pub fn update(&self, pose: &HandPose) -> Result<VolumeReading, PoseError> {
        pose.require(&[LandmarkId::ThumbTip, LandmarkId::IndexTip])?;
        let thumb = pose.point(LandmarkId::ThumbTip)?;
        let index = pose.point(LandmarkId::IndexTip)?;

        let distance = thumb.distance(index);
        let level = self.distance_to_level.apply(distance);
        let percent = self.level_to_percent.apply(level) as u8;

        Ok(VolumeReading {
            thumb,
            index,
            midpoint: thumb.midpoint(index),
            distance,
            level,
            percent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::Landmark;

    fn pinch(thumb: (i32, i32), index: (i32, i32)) -> HandPose {
        HandPose::new(vec![
            Landmark::new(4, thumb.0, thumb.1),
            Landmark::new(8, index.0, index.1),
        ])
        .unwrap()
    }

    fn controller() -> VolumeController {
        VolumeController::new((50.0, 200.0), (-63.0, 0.0)).unwrap()
    }

    #[test]
    fn test_lower_boundary_maps_to_minimum() {
        let reading = controller().update(&pinch((100, 100), (150, 100))).unwrap();
        assert_eq!(reading.distance, 50.0);
        assert_eq!(reading.level, -63.0);
        assert_eq!(reading.percent, 0);
        assert_eq!(reading.midpoint, Point::new(125, 100));
    }

    #[test]
    fn test_clamps_outside_calibration() {
        let c = controller();
        assert_eq!(c.update(&pinch((100, 100), (100, 100))).unwrap().level, -63.0);

        let spread = c.update(&pinch((0, 0), (400, 300))).unwrap();
        assert_eq!(spread.level, 0.0);
        assert_eq!(spread.percent, 100);
    }

    #[test]
    fn test_midrange_level_and_percent() {
        let reading = controller().update(&pinch((0, 0), (125, 0))).unwrap();
        assert_eq!(reading.level, -31.5);
        assert_eq!(reading.percent, 50);
    }

    #[test]
    fn test_missing_index_tip() {
        let pose = HandPose::new(vec![Landmark::new(4, 0, 0)]).unwrap();
        assert_eq!(
            controller().update(&pose),
            Err(PoseError::MissingLandmarks {
                ids: vec![LandmarkId::IndexTip]
            })
        );
    }

    #[test]
    fn test_flat_level_range_rejected() {
        assert!(VolumeController::new((50.0, 200.0), (0.0, 0.0)).is_err());
        assert!(VolumeController::new((200.0, 50.0), (-63.0, 0.0)).is_err());
    }
}
