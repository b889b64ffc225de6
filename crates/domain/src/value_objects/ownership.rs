//! Per-record permission levels.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::UserId;

/// Permission a user holds on a quest record. Ordered: `None < Observer < Owner`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    #[default]
    None,
    Observer,
    Owner,
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionLevel::None => write!(f, "none"),
            PermissionLevel::Observer => write!(f, "observer"),
            PermissionLevel::Owner => write!(f, "owner"),
        }
    }
}

impl FromStr for PermissionLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(PermissionLevel::None),
            "observer" => Ok(PermissionLevel::Observer),
            "owner" => Ok(PermissionLevel::Owner),
            _ => Err(DomainError::parse(format!(
                "Unknown permission level: '{}'. Valid values: none, observer, owner",
                s
            ))),
        }
    }
}

/// Ownership map of a record: a default level plus explicit per-user levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Ownership {
    #[serde(default)]
    pub default: PermissionLevel,
    #[serde(default)]
    pub users: BTreeMap<UserId, PermissionLevel>,
}

impl Ownership {
    pub fn with_default(default: PermissionLevel) -> Self {
        Self {
            default,
            users: BTreeMap::new(),
        }
    }

    /// Explicit entry for a user, if any.
    pub fn user_level(&self, user_id: UserId) -> Option<PermissionLevel> {
        self.users.get(&user_id).copied()
    }

    /// Level that applies to a user.
    ///
    /// Personal records only honor explicit entries; shared records take the
    /// higher of the default and the explicit entry.
    pub fn level_for(&self, user_id: UserId, personal: bool) -> PermissionLevel {
        let explicit = self.user_level(user_id).unwrap_or_default();
        if personal {
            explicit
        } else {
            explicit.max(self.default)
        }
    }

    pub fn grant(&mut self, user_id: UserId, level: PermissionLevel) {
        if level == PermissionLevel::None {
            self.users.remove(&user_id);
        } else {
            self.users.insert(user_id, level);
        }
    }

    /// Whether any player could observe the record through this map.
    pub fn any_observer(&self, personal: bool) -> bool {
        let via_users = self
            .users
            .values()
            .any(|level| *level >= PermissionLevel::Observer);
        if personal {
            via_users
        } else {
            via_users || self.default >= PermissionLevel::Observer
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered() {
        assert!(PermissionLevel::None < PermissionLevel::Observer);
        assert!(PermissionLevel::Observer < PermissionLevel::Owner);
    }

    #[test]
    fn personal_ignores_default() {
        let user = UserId::new();
        let ownership = Ownership::with_default(PermissionLevel::Observer);
        assert_eq!(ownership.level_for(user, false), PermissionLevel::Observer);
        assert_eq!(ownership.level_for(user, true), PermissionLevel::None);
    }

    #[test]
    fn explicit_entry_wins_when_higher() {
        let user = UserId::new();
        let mut ownership = Ownership::with_default(PermissionLevel::Observer);
        ownership.grant(user, PermissionLevel::Owner);
        assert_eq!(ownership.level_for(user, false), PermissionLevel::Owner);
        assert_eq!(ownership.level_for(user, true), PermissionLevel::Owner);

        ownership.grant(user, PermissionLevel::None);
        assert!(ownership.user_level(user).is_none());
    }

    #[test]
    fn ownership_json_shape() {
        let user = UserId::new();
        let mut ownership = Ownership::with_default(PermissionLevel::None);
        ownership.grant(user, PermissionLevel::Owner);
        let json = serde_json::to_value(&ownership).unwrap();
        assert_eq!(json["default"], "none");
        assert_eq!(json["users"][user.to_string()], "owner");

        let back: Ownership = serde_json::from_value(json).unwrap();
        assert_eq!(back, ownership);
    }
}
