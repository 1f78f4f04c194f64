//! Domain factories for creating domain entities and value objects.

use super::PartyId;

/// Factory for generating PartyId instances.
pub struct PartyIdFactory;

impl PartyIdFactory {
    /// Generate a new PartyId with a random UUID v4.
    pub fn generate() -> PartyId {
        PartyId::from_uuid(uuid::Uuid::new_v4())
    }
}
