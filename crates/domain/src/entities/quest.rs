//! Quest entity - A tracked objective with tasks, rewards and subquests
//!
//! A quest is stored as one backing-store record. Parent/subquest links are
//! kept on both sides by hand: `parent` on the child and `subquests` on the
//! parent must be updated together by whoever relinks them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{QuestId, RewardId, TaskId, UserId};
use crate::types::QuestStatus;
use crate::value_objects::{Ownership, PermissionLevel};

/// Who handed out the quest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Giver {
    /// Reference to an actor or document owned by the host
    Actor { uuid: String },
    /// Free-standing name and portrait
    Abstract { name: String, img: String },
}

/// A single objective line of a quest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub hidden: bool,
}

impl Task {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(),
            name: name.into(),
            completed: false,
            hidden: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardKind {
    /// Item data the host can turn into an owned item
    Item,
    /// Narrative reward with just a name and image
    Abstract,
}

/// A reward offered for completing a quest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub id: RewardId,
    #[serde(rename = "type")]
    pub kind: RewardKind,
    #[serde(default)]
    pub hidden: bool,
    /// Locked rewards cannot be dragged off by players
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Reward {
    pub fn new(kind: RewardKind, payload: serde_json::Value) -> Self {
        Self {
            id: RewardId::new(),
            kind,
            hidden: false,
            locked: true,
            payload,
        }
    }

    pub fn abstract_reward(name: impl Into<String>, img: impl Into<String>) -> Self {
        Self::new(
            RewardKind::Abstract,
            serde_json::json!({ "name": name.into(), "img": img.into() }),
        )
    }

    pub fn name(&self) -> &str {
        self.payload
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("")
    }
}

/// Lifecycle timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestDates {
    pub create: DateTime<Utc>,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

/// A quest record.
#[derive(Debug, Clone, PartialEq)]
pub struct Quest {
    pub(crate) id: QuestId,
    pub(crate) name: String,
    pub(crate) status: QuestStatus,
    pub(crate) description: String,
    pub(crate) gm_notes: String,
    pub(crate) player_notes: String,
    pub(crate) giver: Option<Giver>,
    pub(crate) tasks: Vec<Task>,
    pub(crate) rewards: Vec<Reward>,
    pub(crate) parent: Option<QuestId>,
    pub(crate) subquests: Vec<QuestId>,
    pub(crate) personal: bool,
    pub(crate) ownership: Ownership,
    pub(crate) date: QuestDates,
}

impl Quest {
    pub fn new(id: QuestId, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            status: QuestStatus::Inactive,
            description: String::new(),
            gm_notes: String::new(),
            player_notes: String::new(),
            giver: None,
            tasks: Vec::new(),
            rewards: Vec::new(),
            parent: None,
            subquests: Vec::new(),
            personal: false,
            ownership: Ownership::default(),
            date: QuestDates {
                create: now,
                start: None,
                end: None,
            },
        }
    }

    // Read accessors
    pub fn id(&self) -> QuestId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> QuestStatus {
        self.status
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn gm_notes(&self) -> &str {
        &self.gm_notes
    }

    pub fn player_notes(&self) -> &str {
        &self.player_notes
    }

    pub fn giver(&self) -> Option<&Giver> {
        self.giver.as_ref()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn rewards(&self) -> &[Reward] {
        &self.rewards
    }

    pub fn parent(&self) -> Option<QuestId> {
        self.parent
    }

    pub fn subquests(&self) -> &[QuestId] {
        &self.subquests
    }

    pub fn is_personal(&self) -> bool {
        self.personal
    }

    pub fn ownership(&self) -> &Ownership {
        &self.ownership
    }

    pub fn dates(&self) -> &QuestDates {
        &self.date
    }

    /// Self, parent and subquests: every id whose projection embeds this quest.
    pub fn related_ids(&self) -> Vec<QuestId> {
        let mut related = Vec::with_capacity(self.subquests.len() + 2);
        related.push(self.id);
        related.extend(self.parent);
        related.extend(self.subquests.iter().copied());
        related
    }

    pub fn completed_task_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    // Builder methods
    pub fn with_status(mut self, status: QuestStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_giver(mut self, giver: Giver) -> Self {
        self.giver = Some(giver);
        self
    }

    pub fn with_ownership(mut self, ownership: Ownership) -> Self {
        self.ownership = ownership;
        self
    }

    pub fn with_personal(mut self, personal: bool) -> Self {
        self.personal = personal;
        self
    }

    // Mutators
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("Quest name cannot be empty"));
        }
        self.name = name;
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_gm_notes(&mut self, notes: impl Into<String>) {
        self.gm_notes = notes.into();
    }

    pub fn set_player_notes(&mut self, notes: impl Into<String>) {
        self.player_notes = notes.into();
    }

    pub fn set_giver(&mut self, giver: Option<Giver>) {
        self.giver = giver;
    }

    pub fn set_personal(&mut self, personal: bool) {
        self.personal = personal;
    }

    pub fn set_default_permission(&mut self, level: PermissionLevel) {
        self.ownership.default = level;
    }

    pub fn grant(&mut self, user_id: UserId, level: PermissionLevel) {
        self.ownership.grant(user_id, level);
    }

    /// Move to `target`, stamping lifecycle dates. Returns false when the
    /// quest already has that status, so reapplying is a no-op.
    pub fn set_status(&mut self, target: QuestStatus, now: DateTime<Utc>) -> bool {
        if self.status == target {
            return false;
        }
        match target {
            QuestStatus::Active => {
                self.date.start = Some(now);
                self.date.end = None;
            }
            QuestStatus::Completed | QuestStatus::Failed => {
                self.date.end = Some(now);
            }
            QuestStatus::Available | QuestStatus::Inactive => {
                self.date.start = None;
                self.date.end = None;
            }
        }
        self.status = target;
        true
    }

    pub fn set_parent(&mut self, parent: Option<QuestId>) -> Result<(), DomainError> {
        if parent == Some(self.id) {
            return Err(DomainError::constraint("quest cannot be its own parent"));
        }
        self.parent = parent;
        Ok(())
    }

    /// Returns false if the id was already listed.
    pub fn add_subquest(&mut self, id: QuestId) -> Result<bool, DomainError> {
        if id == self.id {
            return Err(DomainError::constraint("quest cannot be its own subquest"));
        }
        if self.subquests.contains(&id) {
            return Ok(false);
        }
        self.subquests.push(id);
        Ok(true)
    }

    pub fn remove_subquest(&mut self, id: QuestId) -> bool {
        let before = self.subquests.len();
        self.subquests.retain(|s| *s != id);
        self.subquests.len() != before
    }

    /// Keep only subquests matching `keep`; returns the dropped ids.
    pub fn retain_subquests(&mut self, mut keep: impl FnMut(QuestId) -> bool) -> Vec<QuestId> {
        let mut dropped = Vec::new();
        self.subquests.retain(|id| {
            let k = keep(*id);
            if !k {
                dropped.push(*id);
            }
            k
        });
        dropped
    }

    pub fn add_task(&mut self, task: Task) -> TaskId {
        let id = task.id;
        self.tasks.push(task);
        id
    }

    pub fn remove_task(&mut self, id: TaskId) -> Option<Task> {
        let index = self.tasks.iter().position(|t| t.id == id)?;
        Some(self.tasks.remove(index))
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn set_task_completed(&mut self, id: TaskId, completed: bool) -> Result<(), DomainError> {
        self.task_mut(id)?.completed = completed;
        Ok(())
    }

    pub fn set_task_hidden(&mut self, id: TaskId, hidden: bool) -> Result<(), DomainError> {
        self.task_mut(id)?.hidden = hidden;
        Ok(())
    }

    fn task_mut(&mut self, id: TaskId) -> Result<&mut Task, DomainError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| DomainError::not_found("Task", id.to_string()))
    }

    pub fn add_reward(&mut self, reward: Reward) -> RewardId {
        let id = reward.id;
        self.rewards.push(reward);
        id
    }

    pub fn reward(&self, id: RewardId) -> Option<&Reward> {
        self.rewards.iter().find(|r| r.id == id)
    }

    /// Remove-if-present; a second removal of the same id returns `None`.
    pub fn remove_reward(&mut self, id: RewardId) -> Option<Reward> {
        let index = self.rewards.iter().position(|r| r.id == id)?;
        Some(self.rewards.remove(index))
    }

    pub fn set_reward_hidden(&mut self, id: RewardId, hidden: bool) -> Result<(), DomainError> {
        self.reward_mut(id)?.hidden = hidden;
        Ok(())
    }

    fn reward_mut(&mut self, id: RewardId) -> Result<&mut Reward, DomainError> {
        self.rewards
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| DomainError::not_found("Reward", id.to_string()))
    }
}
