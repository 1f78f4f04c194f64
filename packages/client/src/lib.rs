//! Terminal client for the watch party server.
//!
//! Connects over WebSocket, forwards playback commands typed at the prompt,
//! and keeps a local playback clock corrected against server events.

pub mod error;
pub mod input;
pub mod playback;
pub mod session;

pub use session::run_client;
