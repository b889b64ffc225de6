//! Delete quest use case.
//!
//! Deletes a quest record after re-linking its neighbours: the parent loses
//! the quest, and every subquest moves up to the parent (or to no parent).

use std::sync::Arc;

use questlog_domain::QuestId;

use crate::entities::Quests;

use super::error::QuestError;

/// What a delete touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub deleted: QuestId,
    /// Quests re-saved while re-linking
    pub saved: Vec<QuestId>,
}

pub struct DeleteQuest {
    quests: Arc<Quests>,
}

impl DeleteQuest {
    pub fn new(quests: Arc<Quests>) -> Self {
        Self { quests }
    }

    /// Execute the cascade delete. Unknown ids are a no-op returning `None`.
    pub async fn execute(&self, id: QuestId) -> Result<Option<DeleteOutcome>, QuestError> {
        let Some(quest) = self.quests.load(id).await? else {
            tracing::debug!(quest_id = %id, "Delete for unknown quest ignored");
            return Ok(None);
        };

        let mut parent = match quest.parent() {
            Some(pid) => self.quests.load(pid).await?,
            None => None,
        };
        let new_parent = parent.as_ref().map(|p| p.id());

        let mut saved = Vec::new();
        for sub_id in quest.subquests() {
            let Some(mut sub) = self.quests.load(*sub_id).await? else {
                continue;
            };
            sub.set_parent(new_parent)?;
            self.quests.save(&sub).await?;
            saved.push(*sub_id);
            if let Some(parent) = parent.as_mut() {
                parent.add_subquest(*sub_id)?;
            }
        }

        if let Some(mut parent) = parent {
            parent.remove_subquest(id);
            self.quests.save(&parent).await?;
            saved.push(parent.id());
        }

        self.quests.delete(id).await?;
        tracing::info!(quest_id = %id, relinked = saved.len(), "Quest deleted");

        Ok(Some(DeleteOutcome { deleted: id, saved }))
    }
}
