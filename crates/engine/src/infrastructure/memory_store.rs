//! In-memory document store.
//!
//! One instance is shared by every client of a world. Each `subscribe()` call
//! gets its own unbounded stream; notifications are pushed while the record
//! lock is held, so every subscriber sees changes in the same order.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};

use questlog_domain::QuestId;

use crate::infrastructure::ports::{DocumentStore, RecordDraft, RepoError, StoreChange, StoreRecord};

pub struct InMemoryDocumentStore {
    collection: Option<String>,
    records: RwLock<BTreeMap<QuestId, StoreRecord>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<StoreChange>>>,
}

impl InMemoryDocumentStore {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: Some(collection.into()),
            records: RwLock::new(BTreeMap::new()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// A store whose quest collection has not been created.
    pub fn without_collection() -> Self {
        Self {
            collection: None,
            records: RwLock::new(BTreeMap::new()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn publish(&self, change: StoreChange) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        subscribers.retain(|tx| tx.send(change.clone()).is_ok());
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn list(&self, collection: &str) -> Result<Vec<StoreRecord>, RepoError> {
        if self.collection.as_deref() != Some(collection) {
            return Err(RepoError::not_found("Collection", collection));
        }
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn get(&self, id: QuestId) -> Result<Option<StoreRecord>, RepoError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn create(&self, draft: RecordDraft) -> Result<StoreRecord, RepoError> {
        let record = StoreRecord {
            id: QuestId::new(),
            name: draft.name,
            ownership: draft.ownership,
            flag: draft.flag,
        };
        let mut records = self.records.write().await;
        records.insert(record.id, record.clone());
        self.publish(StoreChange::Created(record.clone()));
        Ok(record)
    }

    async fn update(&self, id: QuestId, draft: RecordDraft) -> Result<StoreRecord, RepoError> {
        let mut records = self.records.write().await;
        let existing = records
            .get_mut(&id)
            .ok_or_else(|| RepoError::not_found("Record", id))?;

        let flags_changed = existing.flag != draft.flag;
        existing.name = draft.name;
        existing.ownership = draft.ownership;
        existing.flag = draft.flag;
        let record = existing.clone();

        self.publish(StoreChange::Updated {
            record: record.clone(),
            flags_changed,
        });
        Ok(record)
    }

    async fn delete(&self, id: QuestId) -> Result<bool, RepoError> {
        let mut records = self.records.write().await;
        if records.remove(&id).is_none() {
            return Ok(false);
        }
        self.publish(StoreChange::Deleted(id));
        Ok(true)
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<StoreChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(tx);
        rx
    }
}
