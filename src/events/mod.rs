//! Events module for mode transitions
//!
//! Provides structured event types for mode entry, exit, and actuator
//! failures. Events are broadcast to IPC subscribers.

use serde::{Deserialize, Serialize};

use crate::state::Mode;

/// Events emitted by the gesture engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateEvent {
    /// A control mode was entered from Neutral
    ModeEntered { mode: Mode },

    /// A control mode was left via its exit gesture
    ModeExited {
        mode: Mode,
        /// Duration in milliseconds that the mode was active
        duration_ms: u64,
    },

    /// An actuator call failed; the frame's other commands still ran
    ActuatorFailed { actuator: String, message: String },
}

impl std::fmt::Display for StateEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateEvent::ModeEntered { mode } => {
                write!(f, "{}_MODE_ENTERED", mode.to_string().to_uppercase())
            }
            StateEvent::ModeExited { mode, duration_ms } => {
                write!(
                    f,
                    "{}_MODE_EXITED ({}ms)",
                    mode.to_string().to_uppercase(),
                    duration_ms
                )
            }
            StateEvent::ActuatorFailed { actuator, message } => {
                write!(f, "ACTUATOR_FAILED {}: {}", actuator, message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = StateEvent::ModeExited {
            mode: Mode::Volume,
            duration_ms: 1500,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("mode_exited"));
        assert!(json.contains("volume"));
        assert!(json.contains("1500"));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"mode_entered","mode":"cursor"}"#;
        let event: StateEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(event, StateEvent::ModeEntered { mode: Mode::Cursor }));
    }

    #[test]
    fn test_event_display() {
        let event = StateEvent::ModeEntered { mode: Mode::Scroll };
        assert_eq!(event.to_string(), "SCROLL_MODE_ENTERED");
    }
}
