//! Core domain models for watch parties.

use serde::{Deserialize, Serialize};

use super::{
    error::{PartyError, ValueObjectError},
    role::Role,
    value_object::{ClipId, ConnectionId, ParticipantId, PartyId, Position, Timestamp},
};

/// Default maximum number of participants allowed in a party
pub const DEFAULT_PARTICIPANT_CAPACITY: usize = 50;

/// Authoritative playback state of one party.
///
/// While `is_playing` is true the effective position keeps moving with the
/// wall clock from `updated_at`; while paused it stays at `position`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Currently loaded clip, if any
    pub clip_id: Option<ClipId>,
    /// Position written by the last mutation
    pub position: Position,
    /// Whether playback is running
    pub is_playing: bool,
    /// Server time of the last mutation
    pub updated_at: Timestamp,
}

impl PlaybackState {
    /// Paused at position 0 with no clip loaded.
    pub fn paused_at_start(now: Timestamp) -> Self {
        Self {
            clip_id: None,
            position: Position::ZERO,
            is_playing: false,
            updated_at: now,
        }
    }

    /// Position an observer should see at `now`.
    pub fn effective_position(&self, now: Timestamp) -> Result<Position, ValueObjectError> {
        if self.is_playing {
            self.position
                .advance_by_millis(now.millis_since(self.updated_at))
        } else {
            Ok(self.position)
        }
    }

    /// Materialize the state as seen at `now`.
    pub fn view_at(&self, now: Timestamp) -> Result<PlaybackView, ValueObjectError> {
        Ok(PlaybackView {
            clip_id: self.clip_id.clone(),
            position: self.effective_position(now)?,
            is_playing: self.is_playing,
        })
    }
}

/// Playback fields carried by every outbound event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackView {
    pub clip_id: Option<ClipId>,
    pub position: Position,
    pub is_playing: bool,
}

/// Connection status of a roster member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Presence {
    Connected(ConnectionId),
    Disconnected {
        since: Timestamp,
        last_connection: ConnectionId,
    },
}

impl Presence {
    pub fn connection(&self) -> Option<ConnectionId> {
        match self {
            Presence::Connected(id) => Some(*id),
            Presence::Disconnected { .. } => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Presence::Connected(_))
    }
}

/// Represents a participant in a party roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// Participant identifier
    pub id: ParticipantId,
    /// Live role; may differ from the persisted one after host reassignment
    pub role: Role,
    /// Join order, lower is more senior
    pub joined_seq: u64,
    /// Timestamp when the participant first joined
    pub joined_at: Timestamp,
    pub presence: Presence,
}

/// How a participant entered the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// First time in this roster
    Joined,
    /// Already present; `previous` is the connection being superseded, if it was still live
    Reconnected { previous: Option<ConnectionId> },
}

/// Result of admitting a participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmitOutcome {
    pub admission: Admission,
    /// Role the participant holds after admission
    pub role: Role,
    /// Co-host promoted to host as a side effect, if any
    pub promoted: Option<ParticipantId>,
}

/// Result of removing a participant.
#[derive(Debug, Clone, PartialEq)]
pub struct Removal {
    pub participant: Participant,
    /// New host when the removed participant was host and a co-host remained
    pub new_host: Option<ParticipantId>,
}

/// Join-ordered set of participants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roster {
    participants: Vec<Participant>,
    capacity: usize,
    next_seq: u64,
}

impl Roster {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            participants: Vec::new(),
            capacity,
            next_seq: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Number of participants with a live connection
    pub fn live_count(&self) -> usize {
        self.participants
            .iter()
            .filter(|p| p.presence.is_connected())
            .count()
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    pub fn host(&self) -> Option<&Participant> {
        self.participants.iter().find(|p| p.role == Role::Host)
    }

    /// Admit a participant on a new connection.
    ///
    /// A returning participant keeps their seniority and live role. A newcomer
    /// claiming host while a host is present is admitted as co-host.
    ///
    /// # Errors
    ///
    /// Returns `PartyError::PartyFull` if a newcomer would exceed the capacity
    pub fn admit(
        &mut self,
        id: ParticipantId,
        claimed_role: Role,
        connection: ConnectionId,
        now: Timestamp,
    ) -> Result<AdmitOutcome, PartyError> {
        if let Some(existing) = self.participants.iter_mut().find(|p| p.id == id) {
            let previous = existing.presence.connection();
            existing.presence = Presence::Connected(connection);
            let promoted = self.ensure_host();
            let role = self.get(&id).map(|p| p.role).unwrap_or(claimed_role);
            return Ok(AdmitOutcome {
                admission: Admission::Reconnected { previous },
                role,
                promoted,
            });
        }

        if self.participants.len() >= self.capacity {
            return Err(PartyError::PartyFull {
                capacity: self.capacity,
            });
        }

        let role = if claimed_role == Role::Host && self.host().is_some() {
            Role::CoHost
        } else {
            claimed_role
        };
        self.participants.push(Participant {
            id: id.clone(),
            role,
            joined_seq: self.next_seq,
            joined_at: now,
            presence: Presence::Connected(connection),
        });
        self.next_seq += 1;

        let promoted = self.ensure_host();
        let role = self.get(&id).map(|p| p.role).unwrap_or(role);
        Ok(AdmitOutcome {
            admission: Admission::Joined,
            role,
            promoted,
        })
    }

    /// Mark a participant disconnected if `connection` is still their live one.
    pub fn detach(&mut self, id: &ParticipantId, connection: ConnectionId, now: Timestamp) -> bool {
        match self.participants.iter_mut().find(|p| &p.id == id) {
            Some(p) if p.presence == Presence::Connected(connection) => {
                p.presence = Presence::Disconnected {
                    since: now,
                    last_connection: connection,
                };
                true
            }
            _ => false,
        }
    }

    /// Whether `id` is still disconnected since losing `connection`.
    pub fn is_disconnected_from(&self, id: &ParticipantId, connection: ConnectionId) -> bool {
        matches!(
            self.get(id).map(|p| p.presence),
            Some(Presence::Disconnected { last_connection, .. }) if last_connection == connection
        )
    }

    /// Remove a participant, handing host over to the most senior co-host.
    pub fn remove(&mut self, id: &ParticipantId) -> Option<Removal> {
        let index = self.participants.iter().position(|p| &p.id == id)?;
        let participant = self.participants.remove(index);
        let new_host = if participant.role == Role::Host {
            self.ensure_host()
        } else {
            None
        };
        Some(Removal {
            participant,
            new_host,
        })
    }

    /// Promote the most senior co-host when nobody holds host.
    fn ensure_host(&mut self) -> Option<ParticipantId> {
        if self.host().is_some() {
            return None;
        }
        // participants is kept in join order
        let candidate = self
            .participants
            .iter_mut()
            .find(|p| p.role == Role::CoHost)?;
        candidate.role = Role::Host;
        Some(candidate.id.clone())
    }
}

/// One watch party held in memory by its hub
#[derive(Debug, Clone)]
pub struct Party {
    /// Party identifier
    pub id: PartyId,
    /// Authoritative playback state
    pub playback: PlaybackState,
    /// Participants, live or recently disconnected
    pub roster: Roster,
}

impl Party {
    pub fn new(id: PartyId, playback: PlaybackState, capacity: usize) -> Self {
        Self {
            id,
            playback,
            roster: Roster::with_capacity(capacity),
        }
    }
}
