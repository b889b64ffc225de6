//! Set quest status use case.

use std::sync::Arc;

use questlog_domain::{QuestId, QuestStatus};

use crate::entities::Quests;
use crate::infrastructure::ports::ClockPort;

use super::error::QuestError;

/// Moves a quest to an absolute target status. Reapplying the same target
/// is a no-op, so racing GMs converge.
pub struct SetQuestStatus {
    quests: Arc<Quests>,
    clock: Arc<dyn ClockPort>,
}

impl SetQuestStatus {
    pub fn new(quests: Arc<Quests>, clock: Arc<dyn ClockPort>) -> Self {
        Self { quests, clock }
    }

    /// Returns whether the stored quest changed.
    pub async fn execute(&self, id: QuestId, target: QuestStatus) -> Result<bool, QuestError> {
        let Some(mut quest) = self.quests.load(id).await? else {
            tracing::debug!(quest_id = %id, "Status change for missing quest ignored");
            return Ok(false);
        };

        let from = quest.status();
        if !quest.set_status(target, self.clock.now()) {
            return Ok(false);
        }
        self.quests.save(&quest).await?;

        tracing::info!(quest_id = %id, from = %from, to = %target, "Quest status changed");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{MockClockPort, MockDocumentStore, StoreRecord};
    use chrono::{TimeZone, Utc};
    use questlog_domain::{Ownership, Quest};

    fn record(id: QuestId, status: QuestStatus) -> StoreRecord {
        let quest = Quest::new(id, "Bridge Toll", Utc::now()).with_status(status);
        StoreRecord {
            id,
            name: "Bridge Toll".into(),
            ownership: Ownership::default(),
            flag: Some(quest.to_flag().unwrap()),
        }
    }

    #[tokio::test]
    async fn same_target_does_not_write() {
        let id = QuestId::new();
        let mut store = MockDocumentStore::new();
        store
            .expect_get()
            .returning(move |_| Ok(Some(record(id, QuestStatus::Active))));
        store.expect_update().never();

        let mut clock = MockClockPort::new();
        clock.expect_now().returning(Utc::now);

        let use_case = SetQuestStatus::new(Arc::new(Quests::new(Arc::new(store))), Arc::new(clock));
        assert!(!use_case.execute(id, QuestStatus::Active).await.unwrap());
    }

    #[tokio::test]
    async fn completing_stamps_end_date() {
        let id = QuestId::new();
        let finished = Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap();

        let mut store = MockDocumentStore::new();
        store
            .expect_get()
            .returning(move |_| Ok(Some(record(id, QuestStatus::Active))));
        store
            .expect_update()
            .withf(move |_, draft| {
                let flag = draft.flag.as_ref().unwrap();
                flag["status"] == "completed" && flag["date"]["end"].is_string()
            })
            .times(1)
            .returning(|id, draft| {
                Ok(StoreRecord {
                    id,
                    name: draft.name,
                    ownership: draft.ownership,
                    flag: draft.flag,
                })
            });

        let mut clock = MockClockPort::new();
        clock.expect_now().return_const(finished);

        let use_case = SetQuestStatus::new(Arc::new(Quests::new(Arc::new(store))), Arc::new(clock));
        assert!(use_case.execute(id, QuestStatus::Completed).await.unwrap());
    }

    #[tokio::test]
    async fn missing_quest_is_not_an_error() {
        let mut store = MockDocumentStore::new();
        store.expect_get().returning(|_| Ok(None));
        let clock = MockClockPort::new();

        let use_case = SetQuestStatus::new(Arc::new(Quests::new(Arc::new(store))), Arc::new(clock));
        assert!(!use_case
            .execute(QuestId::new(), QuestStatus::Failed)
            .await
            .unwrap());
    }
}
