//! State machine module for mode management
//!
//! Provides a latched state machine with four modes:
//! - Neutral: Default mode, no control scheme active
//! - Scroll: Entered with index (or index+middle), left with a fist
//! - Volume: Entered with thumb+index, left by raising the pinky
//! - Cursor: Entered with an open palm, left by curling index..pinky

mod machine;

pub use machine::{transition, Mode, ModeState, ModeStateMachine};
