//! IPC module for detector and UI communication

mod protocol;
mod server;

pub use server::Server;
