//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueObjectError {
    /// ParticipantId validation error
    #[error("ParticipantId cannot be empty")]
    ParticipantIdEmpty,

    /// ParticipantId too long error
    #[error("ParticipantId cannot exceed {max} characters (got {actual})")]
    ParticipantIdTooLong { max: usize, actual: usize },

    /// PartyId validation error
    #[error("PartyId cannot be empty")]
    PartyIdEmpty,

    /// PartyId too long error
    #[error("PartyId cannot exceed {max} characters (got {actual})")]
    PartyIdTooLong { max: usize, actual: usize },

    /// ClipId validation error
    #[error("ClipId cannot be empty")]
    ClipIdEmpty,

    /// ClipId too long error
    #[error("ClipId cannot exceed {max} characters (got {actual})")]
    ClipIdTooLong { max: usize, actual: usize },

    /// Position below zero
    #[error("Position cannot be negative (got {0})")]
    PositionNegative(f64),

    /// Position is NaN or infinite
    #[error("Position must be a finite number")]
    PositionNotFinite,

    /// Unknown role name
    #[error("Unknown role: {0}")]
    UnknownRole(String),
}

/// Errors related to Party domain logic
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PartyError {
    /// Roster capacity exceeded error
    #[error("Party is full: maximum {capacity} participants allowed")]
    PartyFull { capacity: usize },
}

/// Unexpected failure inside the command processor.
///
/// The faulting command is treated as a no-op.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProcessorError {
    #[error("internal command processor error: {0}")]
    Internal(String),
}

/// Errors reported by the party persistence collaborator
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Party not found: {0}")]
    PartyNotFound(String),

    #[error("Repository unavailable: {0}")]
    Unavailable(String),
}
