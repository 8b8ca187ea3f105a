//! Finger extended/retracted classification
//!
//! Assumes a roughly upright hand facing the camera. The thumb is judged
//! along the horizontal axis because it extends sideways; a hand held
//! sideways or mirrored (left vs right) will misreport the thumb.

use serde::{Deserialize, Serialize};

use super::pose::{HandPose, LandmarkId, PoseError};

/// Tip and reference joint for each digit, thumb first
const DIGITS: [(LandmarkId, LandmarkId); 5] = [
    (LandmarkId::ThumbTip, LandmarkId::ThumbIp),
    (LandmarkId::IndexTip, LandmarkId::IndexPip),
    (LandmarkId::MiddleTip, LandmarkId::MiddlePip),
    (LandmarkId::RingTip, LandmarkId::RingPip),
    (LandmarkId::PinkyTip, LandmarkId::PinkyPip),
];

/// Landmarks read by `classify_fingers`
const REQUIRED: [LandmarkId; 10] = [
    LandmarkId::ThumbIp,
    LandmarkId::ThumbTip,
    LandmarkId::IndexPip,
    LandmarkId::IndexTip,
    LandmarkId::MiddlePip,
    LandmarkId::MiddleTip,
    LandmarkId::RingPip,
    LandmarkId::RingTip,
    LandmarkId::PinkyPip,
    LandmarkId::PinkyTip,
];

/// Which fingers are extended in the current frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FingerVector {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerVector {
    /// Build from `[thumb, index, middle, ring, pinky]`
    pub const fn from_array(fingers: [bool; 5]) -> Self {
        Self {
            thumb: fingers[0],
            index: fingers[1],
            middle: fingers[2],
            ring: fingers[3],
            pinky: fingers[4],
        }
    }

    pub const fn as_array(&self) -> [bool; 5] {
        [self.thumb, self.index, self.middle, self.ring, self.pinky]
    }

    /// Every finger retracted
    pub fn is_fist(&self) -> bool {
        !self.thumb && self.fingers_retracted()
    }

    /// Every finger extended
    pub fn is_open_palm(&self) -> bool {
        self.thumb && self.index && self.middle && self.ring && self.pinky
    }

    /// Only the index finger extended
    pub fn is_index_only(&self) -> bool {
        *self == Self::from_array([false, true, false, false, false])
    }

    /// Index and middle extended, the rest retracted
    pub fn is_index_middle(&self) -> bool {
        *self == Self::from_array([false, true, true, false, false])
    }

    /// Thumb and index extended, the rest retracted
    pub fn is_thumb_index(&self) -> bool {
        *self == Self::from_array([true, true, false, false, false])
    }

    /// Index through pinky all retracted, thumb ignored
    pub fn fingers_retracted(&self) -> bool {
        !self.index && !self.middle && !self.ring && !self.pinky
    }
}

impl std::fmt::Display for FingerVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bits: String = self
            .as_array()
            .iter()
            .map(|up| if *up { '1' } else { '0' })
            .collect();
        write!(f, "[{}]", bits)
    }
}

/// Classify each finger of `pose` as extended or retracted
///
/// Thumb: extended when its tip lies to the right of the IP joint.
/// Other fingers: extended when the tip sits above (smaller y than) the
/// PIP joint two ids below it.
pub fn classify_fingers(pose: &HandPose) -> Result<FingerVector, PoseError> {
    pose.require(&REQUIRED)?;

    let mut fingers = [false; 5];
    for (digit, (tip, joint)) in DIGITS.into_iter().enumerate() {
        let tip = pose.get(tip)?;
        let joint = pose.get(joint)?;
        fingers[digit] = if digit == 0 {
            tip.x > joint.x
        } else {
            tip.y < joint.y
        };
    }

    Ok(FingerVector::from_array(fingers))
}
