//! Quest operation errors.

use questlog_domain::{DomainError, QuestId};
use questlog_shared::SyncError;

use crate::infrastructure::ports::{ChannelError, RepoError};

/// Errors that can occur during quest operations.
#[derive(Debug, thiserror::Error)]
pub enum QuestError {
    #[error("Quest not found: {0}")]
    NotFound(QuestId),
    #[error("Not permitted: {0}")]
    NotPermitted(&'static str),
    #[error("Validation error: {0}")]
    Validation(#[from] DomainError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
    #[error("Sync message error: {0}")]
    Sync(#[from] SyncError),
}
