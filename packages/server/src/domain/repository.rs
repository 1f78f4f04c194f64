//! Repository port for the party persistence collaborator.
//!
//! Party records (creation, membership, ending) are owned elsewhere. The hub
//! reads a record when it first comes alive and reports playback snapshots
//! back asynchronously; it never treats the repository as the live source.

use async_trait::async_trait;

use super::{
    entity::PlaybackState,
    error::RepositoryError,
    role::Role,
    value_object::{ParticipantId, PartyId},
};

/// Persisted view of a party, as far as the hub cares.
#[derive(Debug, Clone, PartialEq)]
pub struct PartyRecord {
    pub id: PartyId,
    /// The party was ended by its owner
    pub ended: bool,
    /// Roster cap; the hub default applies when absent
    pub max_participants: Option<usize>,
    /// Last known playback snapshot, if one was ever saved
    pub playback: Option<PlaybackState>,
}

impl PartyRecord {
    pub fn new(id: PartyId) -> Self {
        Self {
            id,
            ended: false,
            max_participants: None,
            playback: None,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PartyRepository: Send + Sync {
    /// Look up a party record.
    async fn find_party(&self, party_id: &PartyId) -> Result<Option<PartyRecord>, RepositoryError>;

    /// Role the participant was admitted with, or `None` if not a member.
    async fn find_member_role(
        &self,
        party_id: &PartyId,
        participant_id: &ParticipantId,
    ) -> Result<Option<Role>, RepositoryError>;

    /// Store the latest playback snapshot.
    async fn save_playback(
        &self,
        party_id: &PartyId,
        playback: PlaybackState,
    ) -> Result<(), RepositoryError>;

    /// Record that the party has ended.
    async fn mark_ended(&self, party_id: &PartyId) -> Result<(), RepositoryError>;
}
