//! HTTP API response DTOs for the watch party server.

use serde::{Deserialize, Serialize};

use watchparty_shared::time::timestamp_to_rfc3339;

use crate::{domain::ParticipantView, hub::PartySummary};

/// Party summary for list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartySummaryDto {
    pub id: String,
    pub participants: Vec<String>,
    pub live_connections: usize,
    pub is_playing: bool,
}

/// Party detail for detail endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyDetailDto {
    pub id: String,
    pub clip_id: Option<String>,
    pub position: f64,
    pub is_playing: bool,
    pub capacity: usize,
    pub participants: Vec<ParticipantDetailDto>,
    pub observed_at: String, // ISO 8601
}

/// Participant detail for party detail endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantDetailDto {
    pub participant_id: String,
    pub role: String,
    pub connected: bool,
}

impl From<&PartySummary> for PartySummaryDto {
    fn from(summary: &PartySummary) -> Self {
        Self {
            id: summary.party_id.as_str().to_string(),
            participants: summary
                .participants
                .iter()
                .map(|p| p.id.as_str().to_string())
                .collect(),
            live_connections: summary.live_connections,
            is_playing: summary.playback.is_playing,
        }
    }
}

impl From<&ParticipantView> for ParticipantDetailDto {
    fn from(view: &ParticipantView) -> Self {
        Self {
            participant_id: view.id.as_str().to_string(),
            role: view.role.as_str().to_string(),
            connected: view.connected,
        }
    }
}

impl PartyDetailDto {
    pub fn from_summary(summary: &PartySummary, observed_at: i64) -> Self {
        Self {
            id: summary.party_id.as_str().to_string(),
            clip_id: summary
                .playback
                .clip_id
                .as_ref()
                .map(|c| c.as_str().to_string()),
            position: summary.playback.position.seconds(),
            is_playing: summary.playback.is_playing,
            capacity: summary.capacity,
            participants: summary
                .participants
                .iter()
                .map(ParticipantDetailDto::from)
                .collect(),
            observed_at: timestamp_to_rfc3339(observed_at),
        }
    }
}
