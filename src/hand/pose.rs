//! Landmark and hand pose types
//!
//! Landmark ids follow the 21-point hand model used by common pose
//! detectors: 0 is the wrist, then four joints per digit from the base
//! outward (thumb 1-4, index 5-8, middle 9-12, ring 13-16, pinky 17-20).

use serde::{Deserialize, Serialize};

/// Number of landmarks in a complete hand pose
pub const LANDMARK_COUNT: usize = 21;

/// Semantic identity of a landmark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum LandmarkId {
    Wrist = 0,
    ThumbCmc = 1,
    ThumbMcp = 2,
    ThumbIp = 3,
    ThumbTip = 4,
    IndexMcp = 5,
    IndexPip = 6,
    IndexDip = 7,
    IndexTip = 8,
    MiddleMcp = 9,
    MiddlePip = 10,
    MiddleDip = 11,
    MiddleTip = 12,
    RingMcp = 13,
    RingPip = 14,
    RingDip = 15,
    RingTip = 16,
    PinkyMcp = 17,
    PinkyPip = 18,
    PinkyDip = 19,
    PinkyTip = 20,
}

impl LandmarkId {
    /// All ids in index order
    pub const ALL: [LandmarkId; LANDMARK_COUNT] = [
        LandmarkId::Wrist,
        LandmarkId::ThumbCmc,
        LandmarkId::ThumbMcp,
        LandmarkId::ThumbIp,
        LandmarkId::ThumbTip,
        LandmarkId::IndexMcp,
        LandmarkId::IndexPip,
        LandmarkId::IndexDip,
        LandmarkId::IndexTip,
        LandmarkId::MiddleMcp,
        LandmarkId::MiddlePip,
        LandmarkId::MiddleDip,
        LandmarkId::MiddleTip,
        LandmarkId::RingMcp,
        LandmarkId::RingPip,
        LandmarkId::RingDip,
        LandmarkId::RingTip,
        LandmarkId::PinkyMcp,
        LandmarkId::PinkyPip,
        LandmarkId::PinkyDip,
        LandmarkId::PinkyTip,
    ];

    /// Position of this landmark in a pose's landmark array
    pub fn index(self) -> usize {
        self as usize
    }

    /// Look up the id for a raw detector index
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl std::fmt::Display for LandmarkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}({})", self, self.index())
    }
}

/// A pixel-space point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in pixels
    pub fn distance(self, other: Point) -> f64 {
        let dx = f64::from(other.x) - f64::from(self.x);
        let dy = f64::from(other.y) - f64::from(self.y);
        dx.hypot(dy)
    }

    /// Integer midpoint, rounding toward negative infinity
    pub fn midpoint(self, other: Point) -> Point {
        Point {
            x: midpoint(self.x, other.x),
            y: midpoint(self.y, other.y),
        }
    }
}

/// Widened so any pair of coordinates has a midpoint
fn midpoint(a: i32, b: i32) -> i32 {
    let mid = (i64::from(a) + i64::from(b)).div_euclid(2);
    // Always between a and b
    mid as i32
}

/// One tracked point of a hand in image space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Raw landmark id (0-20)
    pub id: u8,
    /// Horizontal pixel position, growing rightward
    pub x: i32,
    /// Vertical pixel position, growing downward
    pub y: i32,
    /// Relative depth, only present when the detector was asked for it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
}

impl Landmark {
    #[cfg(test)]
    pub fn new(id: u8, x: i32, y: i32) -> Self {
        Self { id, x, y, z: None }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Errors raised while building or reading a hand pose
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PoseError {
    #[error("no hand detected in frame")]
    NoHandDetected,

    #[error("missing landmarks: {ids:?}")]
    MissingLandmarks { ids: Vec<LandmarkId> },

    #[error("landmark id {id} is outside 0..=20")]
    LandmarkOutOfRange { id: u8 },

    #[error("landmark id {id} appears more than once")]
    DuplicateLandmark { id: u8 },
}

/// Immutable landmark snapshot for one hand in one frame
#[derive(Debug, Clone, PartialEq)]
pub struct HandPose {
    landmarks: [Option<Landmark>; LANDMARK_COUNT],
}

impl HandPose {
    /// Build a pose from detector output
    ///
    /// An empty landmark list is reported as `NoHandDetected`. Ids must be
    /// unique and within range; gaps are allowed and surface later as
    /// `MissingLandmarks` when a consumer needs the absent point.
    pub fn new<I>(landmarks: I) -> Result<Self, PoseError>
    where
        I: IntoIterator<Item = Landmark>,
    {
        let mut slots = [None; LANDMARK_COUNT];
        let mut seen_any = false;

        for landmark in landmarks {
            seen_any = true;
            let id = LandmarkId::from_index(usize::from(landmark.id))
                .ok_or(PoseError::LandmarkOutOfRange { id: landmark.id })?;
            let slot = &mut slots[id.index()];
            if slot.is_some() {
                return Err(PoseError::DuplicateLandmark { id: landmark.id });
            }
            *slot = Some(landmark);
        }

        if !seen_any {
            return Err(PoseError::NoHandDetected);
        }

        Ok(Self { landmarks: slots })
    }

    /// Build a pose from 21 pixel positions given in id order
    #[cfg(test)]
    pub fn from_points(points: [(i32, i32); LANDMARK_COUNT]) -> Self {
        let mut landmarks = [None; LANDMARK_COUNT];
        for (index, (x, y)) in points.into_iter().enumerate() {
            landmarks[index] = Some(Landmark::new(index as u8, x, y));
        }
        Self { landmarks }
    }

    /// Look up a single landmark
    pub fn get(&self, id: LandmarkId) -> Result<&Landmark, PoseError> {
        self.landmarks[id.index()]
            .as_ref()
            .ok_or_else(|| PoseError::MissingLandmarks { ids: vec![id] })
    }

    /// Pixel position of a single landmark
    pub fn point(&self, id: LandmarkId) -> Result<Point, PoseError> {
        self.get(id).map(Landmark::point)
    }

    /// Check that every id in `ids` is present, reporting all gaps at once
    pub fn require(&self, ids: &[LandmarkId]) -> Result<(), PoseError> {
        let missing: Vec<LandmarkId> = ids
            .iter()
            .copied()
            .filter(|id| self.landmarks[id.index()].is_none())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PoseError::MissingLandmarks { ids: missing })
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_ids_are_index_ordered() {
        for (index, id) in LandmarkId::ALL.iter().enumerate() {
            assert_eq!(id.index(), index);
            assert_eq!(LandmarkId::from_index(index), Some(*id));
        }
        assert_eq!(LandmarkId::from_index(21), None);
        assert_eq!(LandmarkId::ThumbTip.index(), 4);
        assert_eq!(LandmarkId::PinkyTip.index(), 20);
    }

    #[test]
    fn test_empty_detection_is_no_hand() {
        let result = HandPose::new(Vec::new());
        assert_eq!(result, Err(PoseError::NoHandDetected));
    }

    #[test]
    fn test_out_of_range_id_rejected() {
        let result = HandPose::new(vec![Landmark::new(21, 0, 0)]);
        assert_eq!(result, Err(PoseError::LandmarkOutOfRange { id: 21 }));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let result = HandPose::new(vec![Landmark::new(4, 0, 0), Landmark::new(4, 1, 1)]);
        assert_eq!(result, Err(PoseError::DuplicateLandmark { id: 4 }));
    }

    #[test]
    fn test_partial_pose_reports_missing_ids() {
        let pose = HandPose::new(vec![Landmark::new(4, 100, 100)]).unwrap();
        assert_eq!(pose.point(LandmarkId::ThumbTip).unwrap(), Point::new(100, 100));

        let err = pose
            .require(&[LandmarkId::ThumbTip, LandmarkId::IndexTip, LandmarkId::PinkyTip])
            .unwrap_err();
        assert_eq!(
            err,
            PoseError::MissingLandmarks {
                ids: vec![LandmarkId::IndexTip, LandmarkId::PinkyTip]
            }
        );
    }

    #[test]
    fn test_from_points_fills_every_id() {
        let pose = HandPose::from_points([(1, 2); LANDMARK_COUNT]);
        pose.require(&LandmarkId::ALL).unwrap();
    }

    #[test]
    fn test_point_distance_and_midpoint() {
        let a = Point::new(100, 100);
        let b = Point::new(150, 100);
        assert_eq!(a.distance(b), 50.0);
        assert_eq!(a.midpoint(b), Point::new(125, 100));
        assert_eq!(Point::new(0, 0).distance(Point::new(3, 4)), 5.0);
        assert_eq!(Point::new(-3, 0).midpoint(Point::new(0, 0)), Point::new(-2, 0));
    }

    #[test]
    fn test_extreme_coordinates_do_not_overflow() {
        let far = Point::new(i32::MAX, i32::MAX);
        let near = Point::new(i32::MIN, -100);

        let d = far.distance(near);
        assert!(d.is_finite());
        assert_eq!(Point::new(i32::MAX, 0).distance(Point::new(-1, 0)), 2_147_483_648.0);

        assert_eq!(far.midpoint(far), far);
        assert_eq!(far.midpoint(near), Point::new(-1, 1_073_741_773));
    }

    #[test]
    fn test_landmark_depth_is_optional_on_the_wire() {
        let lm: Landmark = serde_json::from_str(r#"{"id":8,"x":10,"y":20}"#).unwrap();
        assert_eq!(lm.z, None);

        let json = serde_json::to_string(&Landmark::new(8, 10, 20)).unwrap();
        assert!(!json.contains('z'));
    }
}
