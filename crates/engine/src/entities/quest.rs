//! Quest entity module.
//!
//! Bridges domain quests and backing-store records: serializes a quest into
//! the record's flag slot on save and parses records back on load.

use std::sync::Arc;

use questlog_domain::{PayloadError, Quest, QuestId, QuestPayload};

use crate::infrastructure::ports::{DocumentStore, RecordDraft, RepoError, StoreRecord};

/// Quest entity - store access for quest records.
pub struct Quests {
    store: Arc<dyn DocumentStore>,
}

impl Quests {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Parse a record into a quest. Record ownership is authoritative.
    pub fn parse_record(record: &StoreRecord) -> Result<Quest, PayloadError> {
        let quest = QuestPayload::parse(record.id, record.flag.as_ref())?;
        Ok(quest.with_ownership(record.ownership.clone()))
    }

    pub fn draft(quest: &Quest) -> Result<RecordDraft, RepoError> {
        let flag = quest.to_flag().map_err(RepoError::serialization)?;
        Ok(RecordDraft {
            name: quest.name().to_string(),
            ownership: quest.ownership().clone(),
            flag: Some(flag),
        })
    }

    pub async fn list(&self, collection: &str) -> Result<Vec<StoreRecord>, RepoError> {
        self.store.list(collection).await
    }

    /// Load a quest. `Ok(None)` for missing records and records that are not quests.
    pub async fn load(&self, id: QuestId) -> Result<Option<Quest>, RepoError> {
        let Some(record) = self.store.get(id).await? else {
            return Ok(None);
        };
        match Self::parse_record(&record) {
            Ok(quest) => Ok(Some(quest)),
            Err(e) => {
                tracing::debug!(quest_id = %id, error = %e, "Record is not a quest");
                Ok(None)
            }
        }
    }

    pub async fn exists(&self, id: QuestId) -> Result<bool, RepoError> {
        Ok(self.store.get(id).await?.is_some())
    }

    /// Re-serialize the full quest into its record.
    pub async fn save(&self, quest: &Quest) -> Result<(), RepoError> {
        self.store.update(quest.id(), Self::draft(quest)?).await?;
        Ok(())
    }

    /// Create a record for `quest`; the store assigns the returned id.
    pub async fn create(&self, quest: &Quest) -> Result<QuestId, RepoError> {
        let record = self.store.create(Self::draft(quest)?).await?;
        Ok(record.id)
    }

    pub async fn delete(&self, id: QuestId) -> Result<bool, RepoError> {
        self.store.delete(id).await
    }
}
