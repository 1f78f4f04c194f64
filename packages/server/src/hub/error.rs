use thiserror::Error;

use crate::domain::{PartyError, RepositoryError};

/// Errors surfaced by a party hub or the hub manager
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HubError {
    #[error("Party not found: {0}")]
    PartyNotFound(String),

    #[error("Party has ended")]
    PartyEnded,

    #[error("Party is full: maximum {capacity} participants allowed")]
    PartyFull { capacity: usize },

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<PartyError> for HubError {
    fn from(err: PartyError) -> Self {
        match err {
            PartyError::PartyFull { capacity } => HubError::PartyFull { capacity },
        }
    }
}

impl From<RepositoryError> for HubError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::PartyNotFound(id) => HubError::PartyNotFound(id),
            RepositoryError::Unavailable(msg) => HubError::Repository(msg),
        }
    }
}
