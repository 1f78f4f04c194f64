//! Domain layer for watch parties.
//!
//! This module contains playback rules and authorization that are
//! independent of transport, DTOs, and infrastructure concerns.

pub mod command;
pub mod entity;
pub mod error;
pub mod event;
pub mod factory;
pub mod processor;
pub mod repository;
pub mod role;
pub mod value_object;

pub use command::{Command, CommandKind};
pub use entity::{
    Admission, AdmitOutcome, DEFAULT_PARTICIPANT_CAPACITY, Participant, Party, PlaybackState,
    PlaybackView, Presence, Removal, Roster,
};
pub use error::{PartyError, ProcessorError, RepositoryError, ValueObjectError};
pub use event::{ErrorCode, Event, EventError, EventKind, ParticipantView};
pub use factory::PartyIdFactory;
pub use processor::{Outcome, process};
pub use repository::{PartyRecord, PartyRepository};
pub use role::Role;
pub use value_object::{ClipId, ConnectionId, ParticipantId, PartyId, Position, Timestamp};
