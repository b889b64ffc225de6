//! Save quest use case.
//!
//! Persists an edited quest. Rights are checked against the stored record,
//! not the edited copy, so ownership edits cannot grant themselves access.

use std::sync::Arc;

use questlog_domain::{can_edit, Caller, Quest};

use crate::entities::Quests;
use crate::infrastructure::ports::SettingsPort;

use super::error::QuestError;

pub struct SaveQuest {
    quests: Arc<Quests>,
    settings: Arc<dyn SettingsPort>,
}

impl SaveQuest {
    pub fn new(quests: Arc<Quests>, settings: Arc<dyn SettingsPort>) -> Self {
        Self { quests, settings }
    }

    pub async fn execute(&self, caller: &Caller, quest: &Quest) -> Result<(), QuestError> {
        let stored = self
            .quests
            .load(quest.id())
            .await?
            .ok_or(QuestError::NotFound(quest.id()))?;

        if !can_edit(&stored, caller, &self.settings.current()) {
            return Err(QuestError::NotPermitted("caller cannot edit this quest"));
        }

        self.quests.save(quest).await?;
        tracing::debug!(quest_id = %quest.id(), user = %caller.name, "Quest saved");
        Ok(())
    }
}
