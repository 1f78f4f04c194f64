//! Server configuration.
//!
//! Loaded from an optional TOML file; command line flags override the
//! listen address. Every field has a default, so an empty file is valid.

use serde::Deserialize;
use std::{fs, path::Path, time::Duration};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub hub: HubSettings,
    #[serde(default)]
    pub parties: PartySettings,
}

/// Listen address.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Per-party hub tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct HubSettings {
    /// Roster cap when the party record has none (default: 50).
    #[serde(default = "default_max_participants")]
    pub max_participants: usize,
    /// Outbound queue capacity per connection (default: 64).
    #[serde(default = "default_outbound_capacity")]
    pub outbound_capacity: usize,
    /// How long an empty hub lingers before teardown (default: 30s).
    #[serde(default = "default_idle_grace_secs")]
    pub idle_grace_secs: u64,
    /// How long a disconnected participant stays in the roster (default: 60s).
    #[serde(default = "default_reconnect_window_secs")]
    pub reconnect_window_secs: u64,
    /// A connection with no successful write for this long is dropped (default: 60s).
    #[serde(default = "default_liveness_timeout_secs")]
    pub liveness_timeout_secs: u64,
    /// Keepalive ping interval; must stay below the liveness timeout (default: 25s).
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
}

/// Behaviour of the bundled in-memory party store.
#[derive(Debug, Clone, Deserialize)]
pub struct PartySettings {
    /// Create unknown parties and members on first contact (default: true).
    #[serde(default = "default_auto_provision")]
    pub auto_provision: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_participants() -> usize {
    50
}

fn default_outbound_capacity() -> usize {
    64
}

fn default_idle_grace_secs() -> u64 {
    30
}

fn default_reconnect_window_secs() -> u64 {
    60
}

fn default_liveness_timeout_secs() -> u64 {
    60
}

fn default_ping_interval_secs() -> u64 {
    25
}

fn default_auto_provision() -> bool {
    true
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            max_participants: default_max_participants(),
            outbound_capacity: default_outbound_capacity(),
            idle_grace_secs: default_idle_grace_secs(),
            reconnect_window_secs: default_reconnect_window_secs(),
            liveness_timeout_secs: default_liveness_timeout_secs(),
            ping_interval_secs: default_ping_interval_secs(),
        }
    }
}

impl Default for PartySettings {
    fn default() -> Self {
        Self {
            auto_provision: default_auto_provision(),
        }
    }
}

impl HubSettings {
    pub fn idle_grace(&self) -> Duration {
        Duration::from_secs(self.idle_grace_secs)
    }

    pub fn reconnect_window(&self) -> Duration {
        Duration::from_secs(self.reconnect_window_secs)
    }

    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_secs(self.liveness_timeout_secs)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
