//! Cache lifecycle events for the rendering layer.

use questlog_domain::{QuestId, QuestStatus};

use super::entry::QuestEntry;

#[derive(Debug, Clone)]
pub enum CacheEvent {
    /// A quest became observable (update or consistency check)
    Added(Box<QuestEntry>),
    /// A quest record was created and is observable
    Created(Box<QuestEntry>),
    Updated {
        entry: Box<QuestEntry>,
        /// Whether the stored payload changed
        flags_changed: bool,
        /// Status the entry left, when it moved partitions
        previous_status: Option<QuestStatus>,
    },
    /// A quest stopped being observable
    Removed(QuestId),
    /// A quest record was deleted from the store
    Deleted(QuestId),
}

impl CacheEvent {
    pub fn quest_id(&self) -> QuestId {
        match self {
            CacheEvent::Added(entry) | CacheEvent::Created(entry) => entry.id(),
            CacheEvent::Updated { entry, .. } => entry.id(),
            CacheEvent::Removed(id) | CacheEvent::Deleted(id) => *id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CacheEvent::Added(_) => "added",
            CacheEvent::Created(_) => "created",
            CacheEvent::Updated { .. } => "updated",
            CacheEvent::Removed(_) => "removed",
            CacheEvent::Deleted(_) => "deleted",
        }
    }
}
