//! Hand pose data model and finger classification
//!
//! A `HandPose` is one frame's worth of landmarks for a single tracked
//! hand. `classify_fingers` reduces it to a `FingerVector` that the mode
//! state machine and the controllers consume.

mod fingers;
mod pose;

pub use fingers::{classify_fingers, FingerVector};
pub use pose::{HandPose, Landmark, LandmarkId, Point, PoseError, LANDMARK_COUNT};
