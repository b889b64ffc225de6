//! Stored quest payload.
//!
//! Quests are persisted inside the `flag` slot of a backing-store record as a
//! versioned JSON object. The record id is not part of the payload; the store
//! assigns it and it is re-attached when parsing.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::{Giver, Quest, QuestDates, Reward, Task};
use crate::ids::QuestId;
use crate::types::QuestStatus;
use crate::value_objects::Ownership;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PayloadError {
    /// The record carries no quest payload at all
    #[error("record has no quest payload")]
    Missing,

    #[error("unsupported schema version {0}")]
    UnsupportedVersion(u32),

    /// A status string outside the five known values
    #[error("unknown quest status '{0}'")]
    UnknownStatus(String),

    #[error("malformed quest payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl PayloadError {
    /// Schema mismatches are worth shouting about; other failures just mean
    /// the record is not a quest.
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, PayloadError::UnknownStatus(_))
    }
}

/// Wire shape of a quest inside the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestPayload {
    pub schema_version: u32,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub gm_notes: String,
    #[serde(default)]
    pub player_notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub giver: Option<Giver>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub rewards: Vec<Reward>,
    #[serde(default)]
    pub parent: Option<QuestId>,
    #[serde(default)]
    pub subquests: Vec<QuestId>,
    #[serde(default)]
    pub personal: bool,
    #[serde(default)]
    pub ownership: Ownership,
    pub date: QuestDates,
}

impl QuestPayload {
    /// Parse a raw store flag into a quest with the given record id.
    pub fn parse(id: QuestId, raw: Option<&serde_json::Value>) -> Result<Quest, PayloadError> {
        let raw = match raw {
            Some(v) if !v.is_null() => v,
            _ => return Err(PayloadError::Missing),
        };
        let payload: QuestPayload = serde_json::from_value(raw.clone())?;
        Quest::from_payload(id, payload)
    }
}

impl Quest {
    pub fn from_payload(id: QuestId, payload: QuestPayload) -> Result<Self, PayloadError> {
        if payload.schema_version != SCHEMA_VERSION {
            return Err(PayloadError::UnsupportedVersion(payload.schema_version));
        }
        let status: QuestStatus = payload
            .status
            .parse()
            .map_err(|_| PayloadError::UnknownStatus(payload.status.clone()))?;

        let mut subquests = payload.subquests;
        let mut seen = HashSet::new();
        subquests.retain(|s| *s != id && seen.insert(*s));

        Ok(Self {
            id,
            name: payload.name,
            status,
            description: payload.description,
            gm_notes: payload.gm_notes,
            player_notes: payload.player_notes,
            giver: payload.giver,
            tasks: payload.tasks,
            rewards: payload.rewards,
            parent: payload.parent.filter(|p| *p != id),
            subquests,
            personal: payload.personal,
            ownership: payload.ownership,
            date: payload.date,
        })
    }

    pub fn to_payload(&self) -> QuestPayload {
        QuestPayload {
            schema_version: SCHEMA_VERSION,
            name: self.name.clone(),
            status: self.status.as_str().to_string(),
            description: self.description.clone(),
            gm_notes: self.gm_notes.clone(),
            player_notes: self.player_notes.clone(),
            giver: self.giver.clone(),
            tasks: self.tasks.clone(),
            rewards: self.rewards.clone(),
            parent: self.parent,
            subquests: self.subquests.clone(),
            personal: self.personal,
            ownership: self.ownership.clone(),
            date: self.date,
        }
    }

    /// Serialized payload ready for the store's flag slot.
    pub fn to_flag(&self) -> Result<serde_json::Value, PayloadError> {
        Ok(serde_json::to_value(self.to_payload())?)
    }
}
