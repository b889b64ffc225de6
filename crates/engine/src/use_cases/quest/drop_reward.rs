//! Drop reward use case.
//!
//! Transfers a reward off a quest to a receiving actor. The reward leaves
//! the quest at most once; handing the item to the actor is up to the host.

use std::sync::Arc;

use questlog_domain::{QuestId, Reward, RewardId};

use crate::entities::Quests;

use super::error::QuestError;

pub struct DropReward {
    quests: Arc<Quests>,
}

impl DropReward {
    pub fn new(quests: Arc<Quests>) -> Self {
        Self { quests }
    }

    /// Execute the drop.
    ///
    /// # Arguments
    /// * `actor` - Host reference of the receiving actor
    /// * `allow_locked` - Whether locked rewards may be taken (GM-initiated drops)
    ///
    /// # Returns
    /// * `Ok(Some(reward))` - Reward removed from the quest
    /// * `Ok(None)` - Quest or reward already gone
    /// * `Err(QuestError::NotPermitted)` - Reward is locked
    pub async fn execute(
        &self,
        quest_id: QuestId,
        reward_id: RewardId,
        actor: &str,
        allow_locked: bool,
    ) -> Result<Option<Reward>, QuestError> {
        let Some(mut quest) = self.quests.load(quest_id).await? else {
            return Ok(None);
        };

        match quest.reward(reward_id) {
            None => {
                tracing::debug!(quest_id = %quest_id, reward_id = %reward_id, "Reward already taken");
                return Ok(None);
            }
            Some(reward) if reward.locked && !allow_locked => {
                return Err(QuestError::NotPermitted("reward is locked"));
            }
            Some(_) => {}
        }

        let reward = quest.remove_reward(reward_id);
        self.quests.save(&quest).await?;

        tracing::info!(quest_id = %quest_id, reward_id = %reward_id, actor = %actor, "Reward dropped");
        Ok(reward)
    }
}
