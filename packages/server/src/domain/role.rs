//! Participant roles and the command authorization table.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::{command::CommandKind, error::ValueObjectError};

/// Role of a participant inside a party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Host,
    CoHost,
    Viewer,
}

impl Role {
    /// Authorization table.
    ///
    /// | command        | host | co-host | viewer |
    /// |----------------|------|---------|--------|
    /// | play / pause   | yes  | yes     | no     |
    /// | seek / skip    | yes  | yes     | no     |
    /// | sync-request   | yes  | yes     | yes    |
    pub fn can_issue(self, kind: CommandKind) -> bool {
        match kind {
            CommandKind::SyncRequest => true,
            CommandKind::Play | CommandKind::Pause | CommandKind::Seek | CommandKind::Skip => {
                matches!(self, Role::Host | Role::CoHost)
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Host => "host",
            Role::CoHost => "co-host",
            Role::Viewer => "viewer",
        }
    }
}

impl FromStr for Role {
    type Err = ValueObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "host" => Ok(Role::Host),
            "co-host" => Ok(Role::CoHost),
            "viewer" => Ok(Role::Viewer),
            other => Err(ValueObjectError::UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MUTATING: [CommandKind; 4] = [
        CommandKind::Play,
        CommandKind::Pause,
        CommandKind::Seek,
        CommandKind::Skip,
    ];

    #[test]
    fn test_host_and_co_host_may_control_playback() {
        // テスト項目: host と co-host は再生操作コマンドを発行できる
        for role in [Role::Host, Role::CoHost] {
            for kind in MUTATING {
                assert!(role.can_issue(kind), "{role} should issue {kind:?}");
            }
        }
    }

    #[test]
    fn test_viewer_may_only_request_sync() {
        // テスト項目: viewer は sync-request のみ発行できる
        for kind in MUTATING {
            assert!(!Role::Viewer.can_issue(kind));
        }
        assert!(Role::Viewer.can_issue(CommandKind::SyncRequest));
    }

    #[test]
    fn test_role_serde_uses_kebab_case() {
        // テスト項目: co-host はケバブケースでシリアライズされる
        let json = serde_json::to_string(&Role::CoHost).unwrap();
        assert_eq!(json, "\"co-host\"");
        assert_eq!("co-host".parse::<Role>().unwrap(), Role::CoHost);
        assert!("admin".parse::<Role>().is_err());
    }
}
