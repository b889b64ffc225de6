//! Set primary quest use case.

use std::sync::Arc;

use questlog_domain::QuestId;

use crate::infrastructure::ports::SettingsPort;

use super::error::QuestError;

/// Pins (or clears) the world's primary quest. Absolute target.
pub struct SetPrimaryQuest {
    settings: Arc<dyn SettingsPort>,
}

impl SetPrimaryQuest {
    pub fn new(settings: Arc<dyn SettingsPort>) -> Self {
        Self { settings }
    }

    /// Returns whether the setting changed.
    pub async fn execute(&self, quest_id: Option<QuestId>) -> Result<bool, QuestError> {
        let mut settings = self.settings.current();
        if settings.primary_quest == quest_id {
            return Ok(false);
        }
        settings.primary_quest = quest_id;
        self.settings.update(settings).await?;

        match quest_id {
            Some(id) => tracing::info!(quest_id = %id, "Primary quest set"),
            None => tracing::info!("Primary quest cleared"),
        }
        Ok(true)
    }
}
