//! Value Objects for domain models.
//!
//! Value Objects are immutable objects that represent values in the domain.
//! They are compared by their value, not by identity.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ValueObjectError;

const MAX_ID_LEN: usize = 100;
const MAX_CLIP_ID_LEN: usize = 200;

fn validate_len(
    value: &str,
    max: usize,
    empty: ValueObjectError,
    too_long: impl FnOnce(usize, usize) -> ValueObjectError,
) -> Result<(), ValueObjectError> {
    if value.is_empty() {
        return Err(empty);
    }
    let len = value.chars().count();
    if len > max {
        return Err(too_long(max, len));
    }
    Ok(())
}

/// Participant identifier value object.
///
/// Handed over by the authentication collaborator; the hub never invents one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Create a new ParticipantId.
    ///
    /// # Arguments
    ///
    /// * `id` - The participant identifier string
    ///
    /// # Returns
    ///
    /// A Result containing the ParticipantId or an error if validation fails
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        validate_len(
            &id,
            MAX_ID_LEN,
            ValueObjectError::ParticipantIdEmpty,
            |max, actual| ValueObjectError::ParticipantIdTooLong { max, actual },
        )?;
        Ok(Self(id))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to owned String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Party identifier value object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartyId(String);

impl PartyId {
    /// Create a new PartyId.
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        validate_len(
            &id,
            MAX_ID_LEN,
            ValueObjectError::PartyIdEmpty,
            |max, actual| ValueObjectError::PartyIdTooLong { max, actual },
        )?;
        Ok(Self(id))
    }

    /// Create a PartyId from a UUID.
    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid.to_string())
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PartyId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Clip reference value object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClipId(String);

impl ClipId {
    /// Create a new ClipId.
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        validate_len(
            &id,
            MAX_CLIP_ID_LEN,
            ValueObjectError::ClipIdEmpty,
            |max, actual| ValueObjectError::ClipIdTooLong { max, actual },
        )?;
        Ok(Self(id))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ClipId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Playback position in seconds.
///
/// Always finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Position(f64);

impl Position {
    pub const ZERO: Position = Position(0.0);

    /// Create a new Position.
    ///
    /// # Errors
    ///
    /// Returns `ValueObjectError::PositionNotFinite` for NaN or infinities and
    /// `ValueObjectError::PositionNegative` for values below zero.
    pub fn new(seconds: f64) -> Result<Self, ValueObjectError> {
        if !seconds.is_finite() {
            return Err(ValueObjectError::PositionNotFinite);
        }
        if seconds < 0.0 {
            return Err(ValueObjectError::PositionNegative(seconds));
        }
        // Normalize -0.0 so it serializes as 0.
        Ok(Self(seconds.max(0.0)))
    }

    /// Seconds as f64.
    pub fn seconds(&self) -> f64 {
        self.0
    }

    /// Position after `millis` of playback.
    pub fn advance_by_millis(&self, millis: i64) -> Result<Self, ValueObjectError> {
        let elapsed = millis.max(0) as f64 / 1000.0;
        Self::new(self.0 + elapsed)
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let seconds = f64::deserialize(deserializer)?;
        Position::new(seconds).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.0)
    }
}

/// Timestamp value object.
///
/// Represents a Unix timestamp in milliseconds (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create a new Timestamp.
    ///
    /// # Arguments
    ///
    /// * `value` - Unix timestamp in milliseconds
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the inner i64 value.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Milliseconds elapsed since `earlier`, saturating at zero.
    pub fn millis_since(&self, earlier: Timestamp) -> i64 {
        self.0.saturating_sub(earlier.0).max(0)
    }

    /// Timestamp `millis` later.
    pub fn plus_millis(&self, millis: i64) -> Self {
        Self(self.0.saturating_add(millis))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one live connection inside a hub.
///
/// A participant that reconnects gets a new ConnectionId, so stale
/// disconnect notifications from the previous socket can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}
