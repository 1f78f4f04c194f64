//! Outbound events.

use super::{
    entity::{Participant, PlaybackView},
    role::Role,
    value_object::{ParticipantId, PartyId, Timestamp},
};

/// Outbound event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Sync,
    Play,
    Pause,
    Seek,
    Skip,
    ParticipantJoined,
    ParticipantLeft,
    Error,
}

/// Machine readable error codes sent in `error` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidCommand,
    PartyNotFound,
    PartyEnded,
    PartyFull,
    Forbidden,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidCommand => "INVALID_COMMAND",
            ErrorCode::PartyNotFound => "PARTY_NOT_FOUND",
            ErrorCode::PartyEnded => "PARTY_ENDED",
            ErrorCode::PartyFull => "PARTY_FULL",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

/// Participant as shown to other clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantView {
    pub id: ParticipantId,
    pub role: Role,
    pub connected: bool,
}

impl From<&Participant> for ParticipantView {
    fn from(p: &Participant) -> Self {
        Self {
            id: p.id.clone(),
            role: p.role,
            connected: p.presence.is_connected(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventError {
    pub code: ErrorCode,
    pub message: String,
}

/// An outbound event.
///
/// Playback events always carry the party's playback fields as of
/// `server_timestamp`, so any single event is enough to converge a client.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub party_id: PartyId,
    pub server_timestamp: Timestamp,
    pub playback: Option<PlaybackView>,
    pub participant: Option<ParticipantView>,
    pub roster: Option<Vec<ParticipantView>>,
    pub error: Option<EventError>,
}

impl Event {
    pub fn playback(
        kind: EventKind,
        party_id: PartyId,
        view: PlaybackView,
        server_timestamp: Timestamp,
    ) -> Self {
        Self {
            kind,
            party_id,
            server_timestamp,
            playback: Some(view),
            participant: None,
            roster: None,
            error: None,
        }
    }

    pub fn participant(
        kind: EventKind,
        party_id: PartyId,
        view: PlaybackView,
        participant: ParticipantView,
        roster: Vec<ParticipantView>,
        server_timestamp: Timestamp,
    ) -> Self {
        Self {
            kind,
            party_id,
            server_timestamp,
            playback: Some(view),
            participant: Some(participant),
            roster: Some(roster),
            error: None,
        }
    }

    pub fn error(
        party_id: PartyId,
        code: ErrorCode,
        message: impl Into<String>,
        server_timestamp: Timestamp,
    ) -> Self {
        Self {
            kind: EventKind::Error,
            party_id,
            server_timestamp,
            playback: None,
            participant: None,
            roster: None,
            error: Some(EventError {
                code,
                message: message.into(),
            }),
        }
    }

    /// Attach the roster, e.g. to the snapshot sent on join.
    pub fn with_roster(mut self, roster: Vec<ParticipantView>) -> Self {
        self.roster = Some(roster);
        self
    }

    /// `sync` and `error` events must survive queue overflow.
    pub fn is_authoritative(&self) -> bool {
        matches!(self.kind, EventKind::Sync | EventKind::Error)
    }

    /// Whether the event carries playback fields.
    pub fn carries_state(&self) -> bool {
        self.playback.is_some()
    }

    /// Re-label a state-carrying event as a full-state `sync` correction.
    ///
    /// The roster is kept; the single-participant delta is not.
    pub fn to_sync(&self) -> Self {
        Self {
            kind: EventKind::Sync,
            party_id: self.party_id.clone(),
            server_timestamp: self.server_timestamp,
            playback: self.playback.clone(),
            participant: None,
            roster: self.roster.clone(),
            error: None,
        }
    }
}
