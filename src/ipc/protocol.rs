//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use serde::{Deserialize, Serialize};

use crate::engine::{EngineStatus, FrameReport};
use crate::events::StateEvent;
use crate::hand::Landmark;

/// Largest accepted message body
pub const MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// Requests from detectors and UIs to the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Request current daemon status
    GetStatus,

    /// Process one frame of detector output; null or empty means no hand
    SubmitFrame {
        #[serde(default)]
        landmarks: Option<Vec<Landmark>>,
    },

    /// Ping to check connectivity
    Ping,

    /// Subscribe to state change notifications
    Subscribe,
}

/// Responses from daemon to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Current daemon status
    Status(DaemonStatus),

    /// Result of a submitted frame
    FrameProcessed(FrameReport),

    /// Pong response to ping
    Pong,

    /// Subscription confirmed
    Subscribed,

    /// Error response
    Error { code: String, message: String },
}

impl Response {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Response::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Push notification from daemon to subscribed clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// State event occurred
    Event { event: StateEvent },
}

/// Full daemon status snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// Daemon version
    pub version: String,

    /// Uptime in seconds
    pub uptime_secs: u64,

    /// Mode, latch and controller availability
    #[serde(flatten)]
    pub engine: EngineStatus,
}

impl DaemonStatus {
    pub fn new(engine: EngineStatus, uptime_secs: u64) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs,
            engine,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Mode;

    #[test]
    fn test_request_serialization() {
        let req = Request::SubmitFrame {
            landmarks: Some(vec![Landmark::new(8, 10, 20)]),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("submit_frame"));
        assert!(json.contains("landmarks"));
    }

    #[test]
    fn test_frame_without_landmarks_parses() {
        let req: Request = serde_json::from_str(r#"{"type":"submit_frame"}"#).unwrap();
        assert!(matches!(req, Request::SubmitFrame { landmarks: None }));

        let req: Request =
            serde_json::from_str(r#"{"type":"submit_frame","landmarks":null}"#).unwrap();
        assert!(matches!(req, Request::SubmitFrame { landmarks: None }));
    }

    #[test]
    fn test_response_serialization() {
        let engine = EngineStatus {
            mode: Mode::Cursor,
            locked: true,
            frames_processed: 7,
            scroll_enabled: true,
            volume_enabled: false,
            cursor_enabled: true,
        };
        let resp = Response::Status(DaemonStatus::new(engine, 3));
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains(r#""type":"status""#));
        assert!(json.contains(r#""mode":"cursor""#));
        assert!(json.contains(r#""frames_processed":7"#));
    }

    #[test]
    fn test_notification_keeps_event_tag() {
        let note = Notification::Event {
            event: StateEvent::ModeEntered { mode: Mode::Scroll },
        };
        let json = serde_json::to_string(&note).unwrap();
        assert!(json.starts_with(r#"{"type":"event","event":{"type":"mode_entered""#));
    }
}
