//! Local playback clock with drift compensation.
//!
//! While playing, the server-side position at local time `now` is
//! `position + (now - server_timestamp)`. The client renders its own clock
//! and only repositions when it drifts outside the sync tolerance, except for
//! explicit control events which are always adopted.

use watchparty_server::infrastructure::dto::websocket::{EventEnvelope, EventType};

/// Acceptable drift before the client must reposition.
pub const SYNC_TOLERANCE_SECS: f64 = 2.0;

/// What applying an event did to the local clock.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// Not a playback event
    Ignored,
    /// Local clock already within tolerance; left untouched
    InSync { drift: f64 },
    /// Local clock moved to the expected position
    Repositioned { drift: f64 },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocalPlayback {
    clip_id: Option<String>,
    /// Position at `anchor`
    position: f64,
    is_playing: bool,
    /// Local time (Unix ms) the position was taken at
    anchor: i64,
}

impl LocalPlayback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clip_id(&self) -> Option<&str> {
        self.clip_id.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Locally rendered position at `now`.
    pub fn position_at(&self, now: i64) -> f64 {
        if self.is_playing {
            self.position + elapsed_secs(self.anchor, now)
        } else {
            self.position
        }
    }

    /// Fold one server event into the local clock.
    pub fn apply(&mut self, event: &EventEnvelope, now: i64) -> Applied {
        let (Some(position), Some(is_playing)) = (event.position, event.is_playing) else {
            return Applied::Ignored;
        };
        let expected = if is_playing {
            position + elapsed_secs(event.server_timestamp, now)
        } else {
            position
        };
        let drift = self.position_at(now) - expected;

        let state_changed = self.is_playing != is_playing || self.clip_id != event.clip_id;
        let explicit = matches!(
            event.r#type,
            EventType::Play | EventType::Pause | EventType::Seek | EventType::Skip
        );
        if !explicit && !state_changed && drift.abs() <= SYNC_TOLERANCE_SECS {
            return Applied::InSync { drift };
        }

        self.clip_id = event.clip_id.clone();
        self.position = expected;
        self.is_playing = is_playing;
        self.anchor = now;
        Applied::Repositioned { drift }
    }
}

/// Seconds between two Unix ms timestamps; never negative so a skewed clock
/// cannot rewind playback.
fn elapsed_secs(from: i64, to: i64) -> f64 {
    (to.saturating_sub(from)).max(0) as f64 / 1000.0
}
