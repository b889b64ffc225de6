//! Cache record wrapping one quest.

use questlog_domain::{
    can_edit, is_observable, is_owner, Caller, Quest, QuestId, QuestSettings, QuestStatus,
};

use super::enrich::EnrichedQuest;

/// Booleans derived from (quest, caller, settings) on every hydrate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryFlags {
    pub is_observable: bool,
    pub is_owner: bool,
    /// Inactive, or no player could observe it
    pub is_hidden: bool,
    pub is_inactive: bool,
    pub is_personal: bool,
    pub can_edit: bool,
}

impl EntryFlags {
    pub fn compute(quest: &Quest, caller: &Caller, settings: &QuestSettings) -> Self {
        let is_inactive = quest.status() == QuestStatus::Inactive;
        Self {
            is_observable: is_observable(quest, caller, settings),
            is_owner: is_owner(quest, caller),
            is_hidden: is_inactive || !quest.ownership().any_observer(quest.is_personal()),
            is_inactive,
            is_personal: quest.is_personal(),
            can_edit: can_edit(quest, caller, settings),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QuestEntry {
    quest: Quest,
    /// Partition the entry lives in; always equal to `quest.status()` once
    /// the partition has relocated it
    status: QuestStatus,
    flags: EntryFlags,
    related: Vec<QuestId>,
    enrich: Option<EnrichedQuest>,
}

impl QuestEntry {
    /// Entry without projection; hydrate before exposing it.
    pub fn new(quest: Quest) -> Self {
        Self {
            status: quest.status(),
            related: quest.related_ids(),
            quest,
            flags: EntryFlags::default(),
            enrich: None,
        }
    }

    pub fn id(&self) -> QuestId {
        self.quest.id()
    }

    pub fn quest(&self) -> &Quest {
        &self.quest
    }

    pub fn status(&self) -> QuestStatus {
        self.status
    }

    pub fn flags(&self) -> EntryFlags {
        self.flags
    }

    pub fn is_observable(&self) -> bool {
        self.flags.is_observable
    }

    pub fn is_owner(&self) -> bool {
        self.flags.is_owner
    }

    pub fn is_hidden(&self) -> bool {
        self.flags.is_hidden
    }

    pub fn is_inactive(&self) -> bool {
        self.flags.is_inactive
    }

    pub fn is_personal(&self) -> bool {
        self.flags.is_personal
    }

    pub fn can_edit(&self) -> bool {
        self.flags.can_edit
    }

    /// Self, parent and subquests.
    pub fn related(&self) -> &[QuestId] {
        &self.related
    }

    /// Render-ready projection, absent until first hydration.
    pub fn enrich(&self) -> Option<&EnrichedQuest> {
        self.enrich.as_ref()
    }

    pub fn is_hydrated(&self) -> bool {
        self.enrich.is_some()
    }

    /// Swap in fresh quest data. Status divergence is left for the
    /// partition to resolve with `relocate`.
    pub(super) fn replace_quest(&mut self, quest: Quest) {
        self.related = quest.related_ids();
        self.quest = quest;
    }

    pub(super) fn set_status(&mut self, status: QuestStatus) {
        self.status = status;
    }

    pub(super) fn hydrate(&mut self, flags: EntryFlags, enrich: EnrichedQuest) {
        self.flags = flags;
        self.related = self.quest.related_ids();
        self.enrich = Some(enrich);
    }
}
