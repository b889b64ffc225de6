//! Observability and edit rules.
//!
//! Pure functions of (quest, caller, settings). The cache re-runs them on
//! every store notification and during consistency checks, so they must not
//! depend on anything else.

use crate::entities::Quest;
use crate::types::{Caller, QuestStatus};
use crate::value_objects::{PermissionLevel, QuestSettings};

/// Whether `caller` may see `quest` at all.
pub fn is_observable(quest: &Quest, caller: &Caller, settings: &QuestSettings) -> bool {
    let privilege = caller.privilege(settings.trusted_player_edit);
    if privilege.is_gm() {
        return true;
    }
    if settings.hide_quest_log {
        return false;
    }

    let level = quest
        .ownership()
        .level_for(caller.user_id, quest.is_personal());

    if quest.status() == QuestStatus::Inactive {
        return privilege.is_trusted_editor() && level == PermissionLevel::Owner;
    }
    level >= PermissionLevel::Observer
}

/// Whether `caller` holds owner rights on `quest`. The GM owns everything.
pub fn is_owner(quest: &Quest, caller: &Caller) -> bool {
    caller.is_gm()
        || quest
            .ownership()
            .level_for(caller.user_id, quest.is_personal())
            == PermissionLevel::Owner
}

/// Whether `caller` may mutate `quest` directly in the backing store.
pub fn can_edit(quest: &Quest, caller: &Caller, settings: &QuestSettings) -> bool {
    let privilege = caller.privilege(settings.trusted_player_edit);
    privilege.is_gm() || (privilege.is_trusted_editor() && is_owner(quest, caller))
}
