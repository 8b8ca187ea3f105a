//! Gesture engine: the per-frame pipeline and its owning task
//!
//! The engine owns the mode state machine and all controllers. Frames are
//! processed strictly one at a time by a single task, so mode state never
//! needs a lock.

mod overlay;
mod pipeline;

pub use overlay::Overlay;
pub use pipeline::{
    CommandFailure, EngineRequest, EngineStatus, FrameReport, GestureEngine, SkipReason,
};
