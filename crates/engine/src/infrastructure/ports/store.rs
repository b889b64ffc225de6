//! Document store port.
//!
//! The host's persistent store. Every client of a world talks to the same
//! store; each client gets its own ordered stream of change notifications.

use async_trait::async_trait;
use tokio::sync::mpsc;

use questlog_domain::{Ownership, PermissionLevel, QuestId, UserId};

use super::error::RepoError;

/// A stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRecord {
    pub id: QuestId,
    pub name: String,
    pub ownership: Ownership,
    /// Module flag slot holding the quest payload, if any
    pub flag: Option<serde_json::Value>,
}

impl StoreRecord {
    /// Host permission test on the record itself.
    pub fn test_permission(&self, user_id: UserId, level: PermissionLevel) -> bool {
        self.ownership.level_for(user_id, false) >= level
    }
}

/// Content for a create or full-replace update.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
    pub name: String,
    pub ownership: Ownership,
    pub flag: Option<serde_json::Value>,
}

/// Store-level change notification.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    Created(StoreRecord),
    Updated {
        record: StoreRecord,
        /// Whether the flag slot changed; ownership-only updates leave it false
        flags_changed: bool,
    },
    Deleted(QuestId),
}

impl StoreChange {
    pub fn id(&self) -> QuestId {
        match self {
            StoreChange::Created(record) => record.id,
            StoreChange::Updated { record, .. } => record.id,
            StoreChange::Deleted(id) => *id,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All records of `collection`. `NotFound` when the collection is missing.
    async fn list(&self, collection: &str) -> Result<Vec<StoreRecord>, RepoError>;
    async fn get(&self, id: QuestId) -> Result<Option<StoreRecord>, RepoError>;
    /// The store assigns the id.
    async fn create(&self, draft: RecordDraft) -> Result<StoreRecord, RepoError>;
    async fn update(&self, id: QuestId, draft: RecordDraft) -> Result<StoreRecord, RepoError>;
    /// Returns whether the record existed.
    async fn delete(&self, id: QuestId) -> Result<bool, RepoError>;

    /// Change notifications in emission order, including this client's own.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<StoreChange>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_permission_uses_default_and_entries() {
        let user = UserId::new();
        let mut record = StoreRecord {
            id: QuestId::new(),
            name: "Quest".into(),
            ownership: Ownership::with_default(PermissionLevel::Observer),
            flag: None,
        };
        assert!(record.test_permission(user, PermissionLevel::Observer));
        assert!(!record.test_permission(user, PermissionLevel::Owner));

        record.ownership.grant(user, PermissionLevel::Owner);
        assert!(record.test_permission(user, PermissionLevel::Owner));
    }
}
