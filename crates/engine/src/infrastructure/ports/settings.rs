//! World settings port.

use async_trait::async_trait;
use tokio::sync::watch;

use questlog_domain::QuestSettings;

use super::error::RepoError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsPort: Send + Sync {
    /// Snapshot of the current settings.
    fn current(&self) -> QuestSettings;
    /// Receiver that observes every change after subscription.
    fn subscribe(&self) -> watch::Receiver<QuestSettings>;
    async fn update(&self, settings: QuestSettings) -> Result<(), RepoError>;
}
