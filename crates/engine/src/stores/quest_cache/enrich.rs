//! Render-ready quest projection.
//!
//! Built per entry on every hydrate. Content the caller may not see (hidden
//! tasks and rewards, GM notes) is stripped here, so the rendering layer can
//! show a projection as-is.

use chrono::{DateTime, Utc};
use serde::Serialize;

use questlog_domain::{Giver, Quest, QuestId, QuestSettings, QuestStatus, RewardId, RewardKind, Task};

use super::entry::EntryFlags;
use super::partition::Partition;

/// Name and status of a linked quest the caller can observe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestSummary {
    pub id: QuestId,
    pub name: String,
    pub status: QuestStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RewardView {
    pub id: RewardId,
    pub kind: RewardKind,
    pub name: String,
    pub hidden: bool,
    pub locked: bool,
    /// Whether the caller may drag it onto an actor
    pub draggable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedQuest {
    pub id: QuestId,
    pub name: String,
    pub status: QuestStatus,
    pub status_label: &'static str,
    pub description: String,
    pub player_notes: String,
    /// Present only for callers who can edit
    pub gm_notes: Option<String>,
    pub giver: Option<Giver>,
    pub tasks: Vec<Task>,
    pub tasks_completed: usize,
    pub tasks_total: usize,
    pub rewards: Vec<RewardView>,
    pub parent: Option<QuestSummary>,
    pub subquests: Vec<QuestSummary>,
    pub is_primary: bool,
    pub is_hidden: bool,
    pub is_personal: bool,
    pub can_edit: bool,
    pub started: Option<DateTime<Utc>>,
    pub ended: Option<DateTime<Utc>>,
}

impl EnrichedQuest {
    pub(super) fn build(
        quest: &Quest,
        flags: &EntryFlags,
        cached: &Partition,
        settings: &QuestSettings,
    ) -> Self {
        let summary = |id: QuestId| {
            cached.get(id).map(|e| QuestSummary {
                id,
                name: e.quest().name().to_string(),
                status: e.quest().status(),
            })
        };

        let tasks: Vec<Task> = quest
            .tasks()
            .iter()
            .filter(|t| flags.can_edit || !t.hidden)
            .cloned()
            .collect();

        let rewards = quest
            .rewards()
            .iter()
            .filter(|r| flags.can_edit || !r.hidden)
            .map(|r| RewardView {
                id: r.id,
                kind: r.kind,
                name: r.name().to_string(),
                hidden: r.hidden,
                locked: r.locked,
                draggable: flags.can_edit || !r.locked,
            })
            .collect();

        Self {
            id: quest.id(),
            name: quest.name().to_string(),
            status: quest.status(),
            status_label: quest.status().label(),
            description: quest.description().to_string(),
            player_notes: quest.player_notes().to_string(),
            gm_notes: flags.can_edit.then(|| quest.gm_notes().to_string()),
            giver: quest.giver().cloned(),
            tasks_completed: tasks.iter().filter(|t| t.completed).count(),
            tasks_total: tasks.len(),
            tasks,
            rewards,
            parent: quest.parent().and_then(summary),
            subquests: quest.subquests().iter().filter_map(|id| summary(*id)).collect(),
            is_primary: settings.primary_quest == Some(quest.id()),
            is_hidden: flags.is_hidden,
            is_personal: flags.is_personal,
            can_edit: flags.can_edit,
            started: quest.dates().start,
            ended: quest.dates().end,
        }
    }
}
