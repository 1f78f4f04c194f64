//! Server state shared by every handler.

use serde::Deserialize;
use std::sync::Arc;

use crate::{config::HubSettings, hub::HubManager};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub participant_id: String,
}

/// Shared application state
pub struct AppState {
    /// Live party hubs (and, through them, the repository)
    pub hubs: HubManager,
    /// Connection timing (ping interval, liveness window)
    pub settings: Arc<HubSettings>,
}

impl AppState {
    pub fn new(hubs: HubManager, settings: HubSettings) -> Self {
        Self {
            hubs,
            settings: Arc::new(settings),
        }
    }
}
