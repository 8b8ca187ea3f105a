//! Unix domain socket server for IPC
//!
//! Detectors submit frames and get the frame report back; UIs query
//! status and may subscribe to pushed state events.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::engine::EngineRequest;
use crate::events::StateEvent;

use super::protocol::{DaemonStatus, Notification, Request, Response, MAX_MESSAGE_LEN};

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: Option<UnixListener>,
    shared: Arc<Shared>,
    shutdown_tx: broadcast::Sender<()>,
}

/// Handles every client connection needs
struct Shared {
    start_time: Instant,
    /// Requests to the engine task
    engine_tx: mpsc::Sender<EngineRequest>,
    /// Source of state events for subscribers
    event_tx: broadcast::Sender<StateEvent>,
}

/// What the reader half hands to the connection loop
type Incoming = std::result::Result<Request, String>;

impl Server {
    /// Create a new IPC server bound to `socket_path`
    pub fn new(
        socket_path: &Path,
        engine_tx: mpsc::Sender<EngineRequest>,
        event_tx: broadcast::Sender<StateEvent>,
    ) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener: Some(listener),
            shared: Arc::new(Shared {
                start_time: Instant::now(),
                engine_tx,
                event_tx,
            }),
            shutdown_tx,
        })
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        let listener = self.listener.as_ref().context("server not initialized")?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let shared = Arc::clone(&self.shared);
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, shared) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    async fn handle_client(stream: UnixStream, shared: Arc<Shared>) -> Result<()> {
        let (reader, mut writer) = stream.into_split();

        // Reads are not cancel-safe, so they live in their own task.
        // Dropping the set aborts it, including when shutdown drops this future.
        let (incoming_tx, mut incoming_rx) = mpsc::channel::<Incoming>(8);
        let mut reader_task = JoinSet::new();
        reader_task.spawn(Self::read_requests(reader, incoming_tx));

        let mut events: Option<broadcast::Receiver<StateEvent>> = None;

        let result = loop {
            tokio::select! {
                incoming = incoming_rx.recv() => {
                    let Some(incoming) = incoming else {
                        break Ok(());
                    };
                    let response = match incoming {
                        Ok(request) => {
                            debug!(?request, "received request");
                            let (response, subscribe) = Self::process_request(request, &shared).await;
                            if subscribe && events.is_none() {
                                debug!("client subscribed to notifications");
                                events = Some(shared.event_tx.subscribe());
                            }
                            response
                        }
                        Err(message) => Response::error("bad_request", message),
                    };
                    if let Err(e) = Self::send_message(&mut writer, &response).await {
                        break Err(e);
                    }
                }
                event = next_event(&mut events) => {
                    match event {
                        Ok(event) => {
                            let note = Notification::Event { event };
                            if let Err(e) = Self::send_message(&mut writer, &note).await {
                                break Err(e);
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(skipped = n, "subscriber lagged behind state events");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            events = None;
                        }
                    }
                }
            }
        };

        reader_task.abort_all();
        result
    }

    /// Read length-prefixed requests until the client disconnects
    async fn read_requests(mut reader: OwnedReadHalf, incoming_tx: mpsc::Sender<Incoming>) {
        let mut len_buf = [0u8; 4];

        loop {
            // Read message length (4-byte little-endian)
            match reader.read_exact(&mut len_buf).await {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    debug!("client disconnected");
                    return;
                }
                Err(e) => {
                    warn!(?e, "client read error");
                    return;
                }
            }

            let len = u32::from_le_bytes(len_buf) as usize;
            if len > MAX_MESSAGE_LEN {
                warn!(len, "message too large, disconnecting");
                return;
            }

            // Read message body
            let mut msg_buf = vec![0u8; len];
            if let Err(e) = reader.read_exact(&mut msg_buf).await {
                warn!(?e, "client read error");
                return;
            }

            let incoming = serde_json::from_slice::<Request>(&msg_buf)
                .map_err(|e| format!("failed to parse request: {}", e));

            if incoming_tx.send(incoming).await.is_err() {
                return;
            }
        }
    }

    /// Send a length-prefixed JSON message
    async fn send_message<T: serde::Serialize>(writer: &mut OwnedWriteHalf, msg: &T) -> Result<()> {
        let msg_bytes = serde_json::to_vec(msg)?;
        let msg_len = (msg_bytes.len() as u32).to_le_bytes();

        writer.write_all(&msg_len).await?;
        writer.write_all(&msg_bytes).await?;

        Ok(())
    }

    /// Process a request and return a response
    /// Returns (Response, should_subscribe)
    async fn process_request(request: Request, shared: &Shared) -> (Response, bool) {
        match request {
            Request::Ping => (Response::Pong, false),

            Request::GetStatus => {
                let (reply, status) = oneshot::channel();
                let sent = shared.engine_tx.send(EngineRequest::Status { reply }).await;
                let response = match (sent, status.await) {
                    (Ok(()), Ok(engine)) => {
                        let uptime = shared.start_time.elapsed().as_secs();
                        Response::Status(DaemonStatus::new(engine, uptime))
                    }
                    _ => Response::error("engine_unavailable", "gesture engine is not running"),
                };
                (response, false)
            }

            Request::SubmitFrame { landmarks } => {
                let (reply, report) = oneshot::channel();
                let request = EngineRequest::Frame { landmarks, reply };
                let response = match shared.engine_tx.send(request).await {
                    Ok(()) => match report.await {
                        Ok(report) => Response::FrameProcessed(report),
                        Err(_) => {
                            Response::error("engine_unavailable", "gesture engine dropped the frame")
                        }
                    },
                    Err(_) => Response::error("engine_unavailable", "gesture engine is not running"),
                };
                (response, false)
            }

            Request::Subscribe => (Response::Subscribed, true),
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

/// Next state event, or never when not subscribed
async fn next_event(
    events: &mut Option<broadcast::Receiver<StateEvent>>,
) -> std::result::Result<StateEvent, broadcast::error::RecvError> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
