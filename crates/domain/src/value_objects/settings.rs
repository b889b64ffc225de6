//! Quest log settings value object
//!
//! Settings are world-wide: every connected client reads the same values and
//! is notified when the GM changes them.
//!
//! Two settings feed the visibility predicate (`hide_quest_log` and
//! `trusted_player_edit`); changing either requires a consistency check of
//! every cache. The rest only alter how projections are built.

use serde::{Deserialize, Serialize};

use super::ownership::PermissionLevel;
use crate::ids::QuestId;

/// All configurable quest log settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestSettings {
    /// Name of the backing-store collection holding quest records
    #[serde(default = "default_collection_name")]
    pub collection_name: String,

    // ============================================================================
    // Visibility
    // ============================================================================
    /// Hide the whole quest log from everyone but the GM
    #[serde(default)]
    pub hide_quest_log: bool,

    /// Trusted players may create and edit the quests they own
    #[serde(default)]
    pub trusted_player_edit: bool,

    // ============================================================================
    // Player permissions
    // ============================================================================
    #[serde(default)]
    pub allow_player_create: bool,

    /// Players may accept available quests (move them to active)
    #[serde(default)]
    pub allow_player_accept: bool,

    /// Default permission applied to newly created quests
    #[serde(default = "default_permission")]
    pub default_permission: PermissionLevel,

    // ============================================================================
    // Display
    // ============================================================================
    /// Include hidden quests in status counts
    #[serde(default)]
    pub count_hidden: bool,

    /// Quest currently pinned as the party's primary quest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_quest: Option<QuestId>,
}

fn default_collection_name() -> String {
    "quests".to_string()
}

fn default_permission() -> PermissionLevel {
    PermissionLevel::Observer
}

impl Default for QuestSettings {
    fn default() -> Self {
        Self {
            collection_name: default_collection_name(),
            hide_quest_log: false,
            trusted_player_edit: false,
            allow_player_create: false,
            allow_player_accept: false,
            default_permission: default_permission(),
            count_hidden: false,
            primary_quest: None,
        }
    }
}

impl QuestSettings {
    /// Load from environment variables, using defaults for missing values
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            collection_name: env_or("QUESTLOG_COLLECTION", defaults.collection_name),
            hide_quest_log: env_or("QUESTLOG_HIDE", defaults.hide_quest_log),
            trusted_player_edit: env_or("QUESTLOG_TRUSTED_PLAYER_EDIT", defaults.trusted_player_edit),
            allow_player_create: env_or("QUESTLOG_ALLOW_PLAYER_CREATE", defaults.allow_player_create),
            allow_player_accept: env_or("QUESTLOG_ALLOW_PLAYER_ACCEPT", defaults.allow_player_accept),
            default_permission: env_or("QUESTLOG_DEFAULT_PERMISSION", defaults.default_permission),
            count_hidden: env_or("QUESTLOG_COUNT_HIDDEN", defaults.count_hidden),
            // Primary quest is chosen at runtime, never from env
            primary_quest: None,
        }
    }

    /// Whether moving from `self` to `next` changes what any caller may observe.
    pub fn visibility_changed(&self, next: &QuestSettings) -> bool {
        self.hide_quest_log != next.hide_quest_log
            || self.trusted_player_edit != next.trusted_player_edit
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_closed() {
        let settings = QuestSettings::default();
        assert!(!settings.hide_quest_log);
        assert!(!settings.allow_player_create);
        assert!(!settings.allow_player_accept);
        assert_eq!(settings.default_permission, PermissionLevel::Observer);
        assert_eq!(settings.collection_name, "quests");
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let settings: QuestSettings = serde_json::from_str(r#"{"count_hidden": true}"#).unwrap();
        assert!(settings.count_hidden);
        assert_eq!(settings.collection_name, "quests");
        assert_eq!(settings.default_permission, PermissionLevel::Observer);
    }

    #[test]
    fn only_visibility_flags_count_as_visibility_changes() {
        let base = QuestSettings::default();

        let mut display_only = base.clone();
        display_only.count_hidden = true;
        display_only.primary_quest = Some(QuestId::new());
        assert!(!base.visibility_changed(&display_only));

        let mut trusted = base.clone();
        trusted.trusted_player_edit = true;
        assert!(base.visibility_changed(&trusted));

        let mut hidden = base.clone();
        hidden.hide_quest_log = true;
        assert!(base.visibility_changed(&hidden));
    }
}
