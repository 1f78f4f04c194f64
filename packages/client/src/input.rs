//! Prompt input parsing.

use thiserror::Error;
use watchparty_server::infrastructure::dto::websocket::{CommandEnvelope, CommandType};

/// One line typed at the prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum InputLine {
    Command(CommandEnvelope),
    /// Print the locally rendered playback state
    Status,
    Help,
    Quit,
    Empty,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("unknown command '{0}' (type 'help')")]
    UnknownCommand(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid position '{0}': expected seconds >= 0")]
    InvalidPosition(String),
}

pub const HELP: &str = "commands: play | pause | seek <seconds> | skip <clip> | sync | status | quit";

/// Parse a prompt line into a command addressed to `party_id`.
///
/// `now` is stamped into the envelope's informational `timestamp`.
pub fn parse_line(line: &str, party_id: &str, now: i64) -> Result<InputLine, InputError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(InputLine::Empty);
    };
    let arg = words.next();
    if words.next().is_some() {
        return Err(InputError::Usage(usage(head)));
    }

    let command = |r#type| {
        let mut envelope = CommandEnvelope::new(r#type, party_id);
        envelope.timestamp = Some(now);
        envelope
    };

    let parsed = match (head.to_ascii_lowercase().as_str(), arg) {
        ("play", None) => InputLine::Command(command(CommandType::Play)),
        ("pause", None) => InputLine::Command(command(CommandType::Pause)),
        ("sync", None) => InputLine::Command(command(CommandType::SyncRequest)),
        ("seek", Some(value)) => {
            let position: f64 = value
                .parse()
                .map_err(|_| InputError::InvalidPosition(value.to_string()))?;
            if !position.is_finite() || position < 0.0 {
                return Err(InputError::InvalidPosition(value.to_string()));
            }
            let mut envelope = command(CommandType::Seek);
            envelope.position = Some(position);
            InputLine::Command(envelope)
        }
        ("skip", Some(clip)) => {
            let mut envelope = command(CommandType::Skip);
            envelope.clip_id = Some(clip.to_string());
            InputLine::Command(envelope)
        }
        ("status", None) => InputLine::Status,
        ("help", None) => InputLine::Help,
        ("quit" | "exit", None) => InputLine::Quit,
        ("play" | "pause" | "sync" | "seek" | "skip" | "status" | "help" | "quit" | "exit", _) => {
            return Err(InputError::Usage(usage(head)));
        }
        (other, _) => return Err(InputError::UnknownCommand(other.to_string())),
    };
    Ok(parsed)
}

fn usage(head: &str) -> &'static str {
    match head.to_ascii_lowercase().as_str() {
        "seek" => "seek <seconds>",
        "skip" => "skip <clip>",
        _ => HELP,
    }
}
