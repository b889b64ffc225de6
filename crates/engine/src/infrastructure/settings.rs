//! In-memory world settings shared by every client.

use async_trait::async_trait;
use tokio::sync::watch;

use questlog_domain::QuestSettings;

use crate::infrastructure::ports::{RepoError, SettingsPort};

pub struct InMemorySettings {
    tx: watch::Sender<QuestSettings>,
}

impl InMemorySettings {
    pub fn new(settings: QuestSettings) -> Self {
        let (tx, _rx) = watch::channel(settings);
        Self { tx }
    }
}

impl Default for InMemorySettings {
    fn default() -> Self {
        Self::new(QuestSettings::default())
    }
}

#[async_trait]
impl SettingsPort for InMemorySettings {
    fn current(&self) -> QuestSettings {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<QuestSettings> {
        self.tx.subscribe()
    }

    async fn update(&self, settings: QuestSettings) -> Result<(), RepoError> {
        tracing::debug!(
            hide_quest_log = settings.hide_quest_log,
            trusted_player_edit = settings.trusted_player_edit,
            "Quest settings updated"
        );
        self.tx.send_replace(settings);
        Ok(())
    }
}
