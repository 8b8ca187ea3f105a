//! Core mode state machine implementation
//!
//! Handles latched transitions between Neutral, Scroll, Volume and Cursor
//! based on the finger vector of each frame.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::events::StateEvent;
use crate::hand::FingerVector;

/// The active control scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// No control scheme, waiting for an entry gesture
    #[default]
    Neutral,
    /// Index (up) or index+middle (down) scrolling
    Scroll,
    /// Thumb-to-index pinch distance sets the volume
    Volume,
    /// Index tip drives the pointer, thumb clicks
    Cursor,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Neutral => write!(f, "Neutral"),
            Mode::Scroll => write!(f, "Scroll"),
            Mode::Volume => write!(f, "Volume"),
            Mode::Cursor => write!(f, "Cursor"),
        }
    }
}

/// Current mode plus the entry latch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeState {
    pub mode: Mode,
    /// Set on entering a mode, cleared only by that mode's exit gesture
    pub locked: bool,
}

impl ModeState {
    pub const NEUTRAL: ModeState = ModeState {
        mode: Mode::Neutral,
        locked: false,
    };

    fn entered(mode: Mode) -> Self {
        Self { mode, locked: true }
    }

    /// New modes may only be entered from here
    pub fn accepts_entry(&self) -> bool {
        self.mode == Mode::Neutral && !self.locked
    }
}

impl std::fmt::Display for ModeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.locked {
            write!(f, "{} (locked)", self.mode)
        } else {
            write!(f, "{}", self.mode)
        }
    }
}

/// Compute the next mode state for one frame
///
/// Pure function; unmatched finger vectors leave the state unchanged.
pub fn transition(state: ModeState, fingers: &FingerVector) -> ModeState {
    if state.accepts_entry() {
        return transition_from_neutral(fingers);
    }

    let exits = match state.mode {
        Mode::Neutral => false,
        Mode::Scroll => fingers.is_fist(),
        Mode::Volume => fingers.pinky,
        Mode::Cursor => fingers.fingers_retracted(),
    };

    if exits {
        ModeState::NEUTRAL
    } else {
        state
    }
}

/// Priority order: fist, scroll, volume, cursor
fn transition_from_neutral(fingers: &FingerVector) -> ModeState {
    if fingers.is_fist() {
        ModeState::NEUTRAL
    } else if fingers.is_index_only() || fingers.is_index_middle() {
        ModeState::entered(Mode::Scroll)
    } else if fingers.is_thumb_index() {
        ModeState::entered(Mode::Volume)
    } else if fingers.is_open_palm() {
        ModeState::entered(Mode::Cursor)
    } else {
        ModeState::NEUTRAL
    }
}

/// Owns the process-wide mode state and reports transitions
pub struct ModeStateMachine {
    /// Current state
    state: ModeState,
    /// Time when the current non-Neutral mode was entered
    mode_entered_at: Option<Instant>,
    /// Channel for emitting state events
    event_tx: broadcast::Sender<StateEvent>,
}

impl ModeStateMachine {
    /// Create a new state machine in `(Neutral, unlocked)`
    pub fn new(event_tx: broadcast::Sender<StateEvent>) -> Self {
        Self {
            state: ModeState::NEUTRAL,
            mode_entered_at: None,
            event_tx,
        }
    }

    /// Get the current state
    pub fn state(&self) -> ModeState {
        self.state
    }

    /// Feed one frame's finger vector, returning the resulting state
    pub fn step(&mut self, fingers: &FingerVector) -> ModeState {
        let next = transition(self.state, fingers);

        if next.mode != self.state.mode {
            self.transition_to(next, fingers);
        } else {
            self.state = next;
        }

        self.state
    }

    /// Perform a state transition
    fn transition_to(&mut self, next: ModeState, fingers: &FingerVector) {
        let old_mode = self.state.mode;
        let duration_ms = self
            .mode_entered_at
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0);

        info!(
            from = %old_mode,
            to = %next.mode,
            %fingers,
            duration_ms = duration_ms,
            "mode transition"
        );

        self.emit_exit_event(old_mode, duration_ms);

        self.state = next;
        self.mode_entered_at = if next.mode != Mode::Neutral {
            Some(Instant::now())
        } else {
            None
        };

        self.emit_entry_event(next.mode);
    }

    /// Emit an exit event for the given mode
    fn emit_exit_event(&self, mode: Mode, duration_ms: u64) {
        if mode == Mode::Neutral {
            return;
        }

        let event = StateEvent::ModeExited { mode, duration_ms };
        debug!(?event, "emitting exit event");
        let _ = self.event_tx.send(event);
    }

    /// Emit an entry event for the given mode
    fn emit_entry_event(&self, mode: Mode) {
        if mode == Mode::Neutral {
            return;
        }

        let event = StateEvent::ModeEntered { mode };
        debug!(?event, "emitting entry event");
        let _ = self.event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIST: FingerVector = FingerVector::from_array([false; 5]);
    const INDEX: FingerVector = FingerVector::from_array([false, true, false, false, false]);
    const INDEX_MIDDLE: FingerVector = FingerVector::from_array([false, true, true, false, false]);
    const THUMB_INDEX: FingerVector = FingerVector::from_array([true, true, false, false, false]);
    const PALM: FingerVector = FingerVector::from_array([true; 5]);

    fn all_vectors() -> impl Iterator<Item = FingerVector> {
        (0u8..32).map(|bits| {
            FingerVector::from_array([
                bits & 1 != 0,
                bits & 2 != 0,
                bits & 4 != 0,
                bits & 8 != 0,
                bits & 16 != 0,
            ])
        })
    }

    fn create_state_machine() -> (ModeStateMachine, broadcast::Receiver<StateEvent>) {
        let (tx, rx) = broadcast::channel(16);
        (ModeStateMachine::new(tx), rx)
    }

    #[test]
    fn test_initial_state() {
        let (sm, _) = create_state_machine();
        assert_eq!(sm.state(), ModeState::NEUTRAL);
    }

    #[test]
    fn test_fist_in_neutral_stays_neutral() {
        let (mut sm, mut rx) = create_state_machine();
        assert_eq!(sm.step(&FIST), ModeState::NEUTRAL);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_neutral_entries() {
        let cases = [
            (INDEX, Mode::Scroll),
            (INDEX_MIDDLE, Mode::Scroll),
            (THUMB_INDEX, Mode::Volume),
            (PALM, Mode::Cursor),
        ];
        for (fingers, mode) in cases {
            let next = transition(ModeState::NEUTRAL, &fingers);
            assert_eq!(next, ModeState { mode, locked: true }, "{}", fingers);
        }
    }

    #[test]
    fn test_unrecognized_vector_in_neutral_is_inert() {
        let three = FingerVector::from_array([false, true, true, true, false]);
        assert_eq!(transition(ModeState::NEUTRAL, &three), ModeState::NEUTRAL);
    }

    #[test]
    fn test_no_mode_change_while_locked_except_exit() {
        for mode in [Mode::Scroll, Mode::Volume, Mode::Cursor] {
            let state = ModeState { mode, locked: true };
            for fingers in all_vectors() {
                let next = transition(state, &fingers);
                assert!(
                    next == state || next == ModeState::NEUTRAL,
                    "{} with {} went to {}",
                    state,
                    fingers,
                    next
                );
            }
        }
    }

    #[test]
    fn test_scroll_round_trip_for_every_entry() {
        for entry in [INDEX, INDEX_MIDDLE] {
            let (mut sm, _) = create_state_machine();
            assert_eq!(sm.step(&entry).mode, Mode::Scroll);
            assert_eq!(sm.step(&FIST), ModeState::NEUTRAL);
        }
    }

    #[test]
    fn test_scroll_ignores_other_entry_gestures() {
        let (mut sm, _) = create_state_machine();
        sm.step(&INDEX);
        assert_eq!(sm.step(&PALM).mode, Mode::Scroll);
        assert_eq!(sm.step(&THUMB_INDEX).mode, Mode::Scroll);
        // Thumb alone is not a fist
        let thumb = FingerVector::from_array([true, false, false, false, false]);
        assert_eq!(sm.step(&thumb).mode, Mode::Scroll);
    }

    #[test]
    fn test_volume_exits_on_pinky() {
        let (mut sm, _) = create_state_machine();
        assert_eq!(sm.step(&THUMB_INDEX), ModeState { mode: Mode::Volume, locked: true });
        assert_eq!(sm.step(&FIST).mode, Mode::Volume);

        let pinky = FingerVector::from_array([false, false, false, false, true]);
        assert_eq!(sm.step(&pinky), ModeState::NEUTRAL);
    }

    #[test]
    fn test_cursor_exit_ignores_thumb() {
        let (mut sm, _) = create_state_machine();
        sm.step(&PALM);
        let thumb = FingerVector::from_array([true, false, false, false, false]);
        assert_eq!(sm.step(&thumb), ModeState::NEUTRAL);

        sm.step(&PALM);
        assert_eq!(sm.step(&FIST), ModeState::NEUTRAL);
    }

    #[test]
    fn test_cursor_holds_while_thumb_clicks() {
        let (mut sm, _) = create_state_machine();
        sm.step(&PALM);
        let click = FingerVector::from_array([false, true, true, true, true]);
        assert_eq!(sm.step(&click).mode, Mode::Cursor);
    }

    #[test]
    fn test_transition_events() {
        let (mut sm, mut rx) = create_state_machine();
        sm.step(&THUMB_INDEX);
        assert!(matches!(
            rx.try_recv().unwrap(),
            StateEvent::ModeEntered { mode: Mode::Volume }
        ));

        let pinky = FingerVector::from_array([false, false, false, false, true]);
        sm.step(&pinky);
        assert!(matches!(
            rx.try_recv().unwrap(),
            StateEvent::ModeExited { mode: Mode::Volume, .. }
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_mode_serialization() {
        assert_eq!(serde_json::to_string(&Mode::Cursor).unwrap(), r#""cursor""#);
        assert_eq!(Mode::default(), Mode::Neutral);
    }
}
