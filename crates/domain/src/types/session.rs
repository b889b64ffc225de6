//! Session-related domain types
//!
//! Types describing who is connected: the host-assigned role of a user and
//! the effective privilege the quest log grants them under current settings.

use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// Host-assigned role of a user.
///
/// Identity management belongs to the host; the quest log only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UserRole {
    /// Game master - full control over the backing store
    Gm,
    /// Player the GM has marked as trusted
    Trusted,
    #[default]
    Player,
}

impl UserRole {
    pub fn is_gm(&self) -> bool {
        matches!(self, UserRole::Gm)
    }

    pub fn is_trusted(&self) -> bool {
        matches!(self, UserRole::Trusted)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Gm => write!(f, "GM"),
            UserRole::Trusted => write!(f, "Trusted"),
            UserRole::Player => write!(f, "Player"),
        }
    }
}

/// Effective privilege of a caller, derived from role and settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    /// Observes and mutates everything
    Gm,
    /// Trusted player while trusted editing is enabled
    TrustedEditor,
    Player,
}

impl Privilege {
    pub fn resolve(role: UserRole, trusted_player_edit: bool) -> Self {
        match role {
            UserRole::Gm => Privilege::Gm,
            UserRole::Trusted if trusted_player_edit => Privilege::TrustedEditor,
            _ => Privilege::Player,
        }
    }

    pub fn is_gm(&self) -> bool {
        matches!(self, Privilege::Gm)
    }

    pub fn is_trusted_editor(&self) -> bool {
        matches!(self, Privilege::TrustedEditor)
    }
}

/// The local user a client acts for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: UserId,
    pub name: String,
    pub role: UserRole,
}

impl Caller {
    pub fn new(user_id: UserId, name: impl Into<String>, role: UserRole) -> Self {
        Self {
            user_id,
            name: name.into(),
            role,
        }
    }

    pub fn gm(name: impl Into<String>) -> Self {
        Self::new(UserId::new(), name, UserRole::Gm)
    }

    pub fn player(name: impl Into<String>) -> Self {
        Self::new(UserId::new(), name, UserRole::Player)
    }

    pub fn trusted(name: impl Into<String>) -> Self {
        Self::new(UserId::new(), name, UserRole::Trusted)
    }

    pub fn is_gm(&self) -> bool {
        self.role.is_gm()
    }

    pub fn privilege(&self, trusted_player_edit: bool) -> Privilege {
        Privilege::resolve(self.role, trusted_player_edit)
    }
}
