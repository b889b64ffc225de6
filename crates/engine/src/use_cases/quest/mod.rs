//! Quest use cases.
//!
//! Each use case performs one store mutation for a caller already allowed to
//! make it. Deciding between local execution and relaying to a GM is the
//! relay's job.

use std::sync::Arc;

mod create_quest;
mod delete_quest;
mod drop_reward;
mod error;
mod save_quest;
mod set_primary;
mod set_status;

pub use create_quest::{CreateQuest, NewQuest};
pub use delete_quest::{DeleteOutcome, DeleteQuest};
pub use drop_reward::DropReward;
pub use error::QuestError;
pub use save_quest::SaveQuest;
pub use set_primary::SetPrimaryQuest;
pub use set_status::SetQuestStatus;

/// Container for quest use cases.
pub struct QuestUseCases {
    pub create: Arc<CreateQuest>,
    pub delete: Arc<DeleteQuest>,
    pub status: Arc<SetQuestStatus>,
    pub primary: Arc<SetPrimaryQuest>,
    pub drop_reward: Arc<DropReward>,
    pub save: Arc<SaveQuest>,
}
