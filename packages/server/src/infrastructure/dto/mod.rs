//! Data Transfer Objects for the HTTP API and the WebSocket protocol.

pub mod http;
pub mod websocket;
