//! gesture-control-daemon: Hand-gesture control of the pointer, scroll and volume
//!
//! The daemon accepts per-frame hand landmarks from an external pose
//! detector and turns them into OS-level actions:
//! - Finger classification from raw landmark geometry
//! - Latched mode state machine (Neutral, Scroll, Volume, Cursor)
//! - Per-mode controllers driving pointer, scroll and volume actuators
//! - IPC server for detectors (frame submission) and UIs (status, events)
//!
//! Camera capture, pose detection and on-screen drawing live in other
//! processes; frame reports carry overlay requests for them.

mod actuator;
mod config;
mod control;
mod engine;
mod events;
mod hand;
mod ipc;
mod lifecycle;
mod state;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::actuator::Actuators;
use crate::config::Config;
use crate::engine::GestureEngine;
use crate::events::StateEvent;
use crate::ipc::Server;
use crate::lifecycle::ShutdownSignal;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "gesture-control-daemon starting"
    );

    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(
        ?config.socket_path,
        ?config.settings_path,
        "configuration loaded"
    );

    let mut shutdown = ShutdownSignal::new()?;

    // Detectors/IPC -> engine
    let (engine_tx, engine_rx) = mpsc::channel(32);
    // Engine -> IPC subscribers and the log below
    let (event_tx, _event_rx) = broadcast::channel::<StateEvent>(64);

    // Set up actuators; a failed one only disables its own controller
    let actuators = Actuators::from_settings(&config.settings);
    let mut engine = GestureEngine::new(&config.settings, actuators, event_tx.clone())?;

    let status = engine.status();
    info!(
        scroll = status.scroll_enabled,
        volume = status.volume_enabled,
        cursor = status.cursor_enabled,
        "controllers initialized"
    );

    let server = Server::new(&config.socket_path, engine_tx, event_tx.clone())?;

    let mut log_event_rx = event_tx.subscribe();

    info!("daemon initialized, entering main loop");

    // Main event loop
    tokio::select! {
        // Run the engine (processes submitted frames one at a time)
        _ = engine.run(engine_rx) => {
            info!("gesture engine exited");
        }

        // Run the IPC server (accepts client connections)
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Log state events
        _ = async {
            loop {
                match log_event_rx.recv().await {
                    Ok(event) => {
                        info!(%event, "state event");
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "state event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        } => {
            info!("state event logger exited");
        }

        // Wait for shutdown signal
        signal = shutdown.wait() => {
            info!(signal, "shutdown signal received");
        }
    }

    // Cleanup
    info!("shutting down...");

    server.shutdown().await;

    info!("gesture-control-daemon stopped");

    Ok(())
}
