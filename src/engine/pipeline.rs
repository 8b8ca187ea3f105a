//! Per-frame gesture pipeline
//!
//! classify fingers -> step the mode state machine -> run the active
//! mode's controller -> dispatch commands to its actuator.

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::actuator::{
    ActuatorError, Actuators, Command, PointerActuator, ScrollActuator, VolumeActuator,
};
use crate::config::{ConfigError, GestureSettings};
use crate::control::{CursorController, ScrollController, VolumeController};
use crate::events::StateEvent;
use crate::hand::{classify_fingers, FingerVector, HandPose, Landmark, PoseError};
use crate::state::{Mode, ModeState, ModeStateMachine};

use super::overlay::Overlay;

/// Why a frame produced no output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    NoHand,
    MissingLandmarks { ids: Vec<u8> },
    InvalidPose { message: String },
}

impl From<PoseError> for SkipReason {
    fn from(error: PoseError) -> Self {
        match error {
            PoseError::NoHandDetected => SkipReason::NoHand,
            PoseError::MissingLandmarks { ids } => SkipReason::MissingLandmarks {
                ids: ids.into_iter().map(|id| id as u8).collect(),
            },
            other => SkipReason::InvalidPose {
                message: other.to_string(),
            },
        }
    }
}

/// A command whose actuator call failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandFailure {
    pub command: Command,
    pub error: String,
}

/// Everything one frame produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Sequence number of this frame
    pub frame: u64,
    pub mode: Mode,
    pub locked: bool,
    pub fingers: Option<FingerVector>,
    /// Commands issued to actuators, in order
    pub commands: Vec<Command>,
    pub overlays: Vec<Overlay>,
    pub skipped: Option<SkipReason>,
    pub failures: Vec<CommandFailure>,
}

impl FrameReport {
    fn new(frame: u64, state: ModeState) -> Self {
        Self {
            frame,
            mode: state.mode,
            locked: state.locked,
            fingers: None,
            commands: Vec::new(),
            overlays: Vec::new(),
            skipped: None,
            failures: Vec::new(),
        }
    }
}

/// Snapshot of the engine for status queries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub mode: Mode,
    pub locked: bool,
    pub frames_processed: u64,
    pub scroll_enabled: bool,
    pub volume_enabled: bool,
    pub cursor_enabled: bool,
}

/// Requests handled by the engine task
#[derive(Debug)]
pub enum EngineRequest {
    /// Process one frame; `None` or an empty list means no hand
    Frame {
        landmarks: Option<Vec<Landmark>>,
        reply: oneshot::Sender<FrameReport>,
    },
    /// Report current status
    Status { reply: oneshot::Sender<EngineStatus> },
}

/// A controller paired with the actuator it drives
struct Controlled<C, A: ?Sized> {
    controller: C,
    actuator: Box<A>,
}

/// The gesture interpretation core
pub struct GestureEngine {
    machine: ModeStateMachine,
    scroll: Option<Controlled<ScrollController, dyn ScrollActuator>>,
    volume: Option<Controlled<VolumeController, dyn VolumeActuator>>,
    cursor: Option<Controlled<CursorController, dyn PointerActuator>>,
    event_tx: broadcast::Sender<StateEvent>,
    frames: u64,
}

impl GestureEngine {
    /// Set up controllers for every actuator that is available
    ///
    /// Invalid settings are an error. An actuator that failed to start,
    /// or reports an unusable range, only disables its own controller.
    pub fn new(
        settings: &GestureSettings,
        actuators: Actuators,
        event_tx: broadcast::Sender<StateEvent>,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;

        let scroll = match actuators.scroll {
            Ok(actuator) => Some(Controlled {
                controller: ScrollController::new(settings.scroll_unit),
                actuator,
            }),
            Err(e) => {
                warn!(%e, "scroll controller disabled");
                None
            }
        };

        let volume = actuators
            .volume
            .and_then(|actuator| {
                let levels = match settings.volume_levels {
                    Some(levels) => levels,
                    None => actuator.level_range()?,
                };
                let controller = VolumeController::new(settings.distance_range, levels)
                    .map_err(|e| unusable("volume", e))?;
                Ok(Controlled {
                    controller,
                    actuator,
                })
            })
            .map_err(|e| warn!(%e, "volume controller disabled"))
            .ok();

        let cursor = actuators
            .pointer
            .and_then(|actuator| {
                let screen = actuator.screen_size()?;
                let controller =
                    CursorController::new(settings.control_zone, screen, settings.click_trigger)
                        .map_err(|e| unusable("pointer", e))?;
                Ok(Controlled {
                    controller,
                    actuator,
                })
            })
            .map_err(|e| warn!(%e, "cursor controller disabled"))
            .ok();

        if let Some(volume) = &volume {
            let (min, max) = volume.controller.levels();
            info!(min, max, "volume controller ready");
        }

        Ok(Self {
            machine: ModeStateMachine::new(event_tx.clone()),
            scroll,
            volume,
            cursor,
            event_tx,
            frames: 0,
        })
    }

    pub fn state(&self) -> ModeState {
        self.machine.state()
    }

    pub fn status(&self) -> EngineStatus {
        let state = self.state();
        EngineStatus {
            mode: state.mode,
            locked: state.locked,
            frames_processed: self.frames,
            scroll_enabled: self.scroll.is_some(),
            volume_enabled: self.volume.is_some(),
            cursor_enabled: self.cursor.is_some(),
        }
    }

    /// Process one frame; `None` means no hand was detected
    pub fn process(&mut self, hand: Option<&HandPose>) -> FrameReport {
        match hand {
            Some(pose) => self.process_pose(pose),
            None => self.skip(PoseError::NoHandDetected),
        }
    }

    /// Process raw detector output for one frame
    pub fn process_landmarks(&mut self, landmarks: Vec<Landmark>) -> FrameReport {
        match HandPose::new(landmarks) {
            Ok(pose) => self.process(Some(&pose)),
            Err(e) => self.skip(e),
        }
    }

    /// Run the engine, processing requests one at a time
    pub async fn run(&mut self, mut request_rx: mpsc::Receiver<EngineRequest>) {
        info!(state = %self.state(), "gesture engine started");

        while let Some(request) = request_rx.recv().await {
            match request {
                EngineRequest::Frame { landmarks, reply } => {
                    let report = match landmarks {
                        Some(landmarks) => self.process_landmarks(landmarks),
                        None => self.process(None),
                    };
                    if reply.send(report).is_err() {
                        debug!("frame requester went away before reply");
                    }
                }
                EngineRequest::Status { reply } => {
                    let _ = reply.send(self.status());
                }
            }
        }

        info!(frames = self.frames, "gesture engine stopped");
    }

    fn next_frame(&mut self) -> u64 {
        self.frames += 1;
        self.frames
    }

    fn skip(&mut self, error: PoseError) -> FrameReport {
        let frame = self.next_frame();
        debug!(frame, %error, "skipping frame");

        let mut report = FrameReport::new(frame, self.machine.state());
        report.skipped = Some(error.into());
        report
    }

    fn process_pose(&mut self, pose: &HandPose) -> FrameReport {
        let fingers = match classify_fingers(pose) {
            Ok(fingers) => fingers,
            Err(e) => return self.skip(e),
        };

        let frame = self.next_frame();
        let before = self.machine.state();
        let after = self.machine.step(&fingers);

        let mut report = FrameReport::new(frame, after);
        report.fingers = Some(fingers);

        let mut commands = Vec::new();
        let result = self.run_controller(before, after, pose, &fingers, &mut report, &mut commands);
        if let Err(e) = result {
            debug!(frame, %e, "controller skipped frame");
            report.skipped = Some(e.into());
            return report;
        }

        for command in commands {
            self.dispatch(command, &mut report);
        }

        debug!(
            frame,
            mode = %after.mode,
            %fingers,
            commands = report.commands.len(),
            "frame processed"
        );
        report
    }

    /// Compute the active controller's commands without issuing them
    fn run_controller(
        &mut self,
        before: ModeState,
        after: ModeState,
        pose: &HandPose,
        fingers: &FingerVector,
        report: &mut FrameReport,
        commands: &mut Vec<Command>,
    ) -> Result<(), PoseError> {
        if after.mode != Mode::Neutral {
            report.overlays.push(Overlay::ModeLabel { mode: after.mode });
        }

        match after.mode {
            Mode::Neutral => {}
            Mode::Scroll => {
                let Some(scroll) = &self.scroll else {
                    return Ok(());
                };
                if let Some((direction, delta)) = scroll.controller.update(fingers) {
                    report.overlays.push(Overlay::ScrollIndicator { direction });
                    commands.push(Command::Scroll { delta });
                }
            }
            Mode::Volume => {
                let Some(volume) = &self.volume else {
                    return Ok(());
                };
                let reading = volume.controller.update(pose)?;
                report.overlays.push(Overlay::PinchLine {
                    thumb: reading.thumb,
                    index: reading.index,
                    midpoint: reading.midpoint,
                });
                report.overlays.push(Overlay::VolumeBar {
                    level: reading.level,
                    percent: reading.percent,
                });
                commands.push(Command::SetVolumeLevel {
                    level: reading.level,
                });
            }
            Mode::Cursor => {
                let Some(cursor) = &mut self.cursor else {
                    return Ok(());
                };
                if before.mode != Mode::Cursor {
                    cursor.controller.reset();
                }
                report.overlays.push(Overlay::ControlZone {
                    zone: cursor.controller.zone(),
                });

                let output = cursor.controller.update(pose, fingers)?;
                commands.push(Command::MoveCursor {
                    x: output.target.x,
                    y: output.target.y,
                });
                if let Some(at) = output.click {
                    report.overlays.push(Overlay::ClickMarker { at });
                    commands.push(Command::Click);
                }
            }
        }

        Ok(())
    }

    /// Issue one command; failures are recorded, never retried
    fn dispatch(&mut self, command: Command, report: &mut FrameReport) {
        let result = match command {
            Command::SetVolumeLevel { level } => match &mut self.volume {
                Some(volume) => volume.actuator.set_level(level),
                None => return,
            },
            Command::Scroll { delta } => match &mut self.scroll {
                Some(scroll) => scroll.actuator.scroll(delta),
                None => return,
            },
            Command::MoveCursor { x, y } => match &mut self.cursor {
                Some(cursor) => cursor.actuator.move_to(x, y),
                None => return,
            },
            Command::Click => match &mut self.cursor {
                Some(cursor) => cursor.actuator.click(),
                None => return,
            },
        };

        report.commands.push(command);

        if let Err(e) = result {
            warn!(%command, %e, "actuator call failed");
            let _ = self.event_tx.send(StateEvent::ActuatorFailed {
                actuator: e.actuator().to_string(),
                message: e.to_string(),
            });
            report.failures.push(CommandFailure {
                command,
                error: e.to_string(),
            });
        }
    }
}

fn unusable(actuator: &'static str, error: ConfigError) -> ActuatorError {
    ActuatorError::Unavailable {
        actuator,
        reason: error.to_string(),
    }
}
