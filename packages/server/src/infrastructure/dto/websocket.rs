//! WebSocket message DTOs for the watch party protocol.

use serde::{Deserialize, Serialize};

use crate::domain::{Event, EventKind, ParticipantView, Role};

/// Inbound command type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandType {
    Play,
    Pause,
    Seek,
    Skip,
    SyncRequest,
}

/// Command sent by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub r#type: CommandType,
    pub party_id: String,
    /// Target position in seconds (`seek`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
    /// Clip to switch to (`skip`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip_id: Option<String>,
    /// Client clock at send time, Unix milliseconds; informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl CommandEnvelope {
    pub fn new(r#type: CommandType, party_id: impl Into<String>) -> Self {
        Self {
            r#type,
            party_id: party_id.into(),
            position: None,
            clip_id: None,
            timestamp: None,
        }
    }
}

/// Outbound event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    Sync,
    Play,
    Pause,
    Seek,
    Skip,
    ParticipantJoined,
    ParticipantLeft,
    Error,
}

impl From<EventKind> for EventType {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Sync => EventType::Sync,
            EventKind::Play => EventType::Play,
            EventKind::Pause => EventType::Pause,
            EventKind::Seek => EventType::Seek,
            EventKind::Skip => EventType::Skip,
            EventKind::ParticipantJoined => EventType::ParticipantJoined,
            EventKind::ParticipantLeft => EventType::ParticipantLeft,
            EventKind::Error => EventType::Error,
        }
    }
}

/// Participant information shown to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub participant_id: String,
    pub role: Role,
    pub connected: bool,
}

impl From<&ParticipantView> for ParticipantInfo {
    fn from(view: &ParticipantView) -> Self {
        Self {
            participant_id: view.id.as_str().to_string(),
            role: view.role,
            connected: view.connected,
        }
    }
}

/// Event sent by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub r#type: EventType,
    pub party_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_playing: Option<bool>,
    /// Server time the playback fields were computed at, Unix milliseconds
    pub server_timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<ParticipantInfo>,
    /// Full roster (join snapshot and participant events)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<ParticipantInfo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl From<&Event> for EventEnvelope {
    fn from(event: &Event) -> Self {
        let playback = event.playback.as_ref();
        Self {
            r#type: event.kind.into(),
            party_id: event.party_id.as_str().to_string(),
            clip_id: playback
                .and_then(|p| p.clip_id.as_ref())
                .map(|c| c.as_str().to_string()),
            position: playback.map(|p| p.position.seconds()),
            is_playing: playback.map(|p| p.is_playing),
            server_timestamp: event.server_timestamp.value(),
            participant: event.participant.as_ref().map(ParticipantInfo::from),
            participants: event
                .roster
                .as_ref()
                .map(|roster| roster.iter().map(ParticipantInfo::from).collect()),
            message: event.error.as_ref().map(|e| e.message.clone()),
            code: event.error.as_ref().map(|e| e.code.as_str().to_string()),
        }
    }
}
