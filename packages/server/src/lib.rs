//! Watch party synchronization server.
//!
//! One `PartyHub` per active party owns the authoritative playback state and
//! fans events out to every connected participant over WebSocket.

pub mod common;
pub mod config;
pub mod domain;
pub mod hub;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
