//! WebSocket / HTTP surface of the watch party server.

mod handler;
mod runner;
mod signal;
pub mod state;

pub use runner::{ServerError, build_app, run, serve};
pub use signal::shutdown_signal;
