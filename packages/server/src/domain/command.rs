//! Inbound playback commands.

use super::value_object::{ClipId, Position};

/// A typed inbound command, already validated.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play,
    Pause,
    Seek(Position),
    Skip(ClipId),
    SyncRequest,
}

/// Command discriminant used by the authorization table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Play,
    Pause,
    Seek,
    Skip,
    SyncRequest,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Play => CommandKind::Play,
            Command::Pause => CommandKind::Pause,
            Command::Seek(_) => CommandKind::Seek,
            Command::Skip(_) => CommandKind::Skip,
            Command::SyncRequest => CommandKind::SyncRequest,
        }
    }

    /// Whether applying the command changes party state.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Command::SyncRequest)
    }
}
