//! Quest log sync protocol
//!
//! Every client of a world shares one fire-and-forget broadcast channel. Each
//! message is an [`Envelope`] `{ "type": string, "payload": object }`.
//!
//! Mutating messages carry `handled`. The sender sets it when it already
//! applied the mutation itself; receivers only refresh their views in that
//! case. When `handled` is false the first GM to receive the message applies
//! it. Mutations are absolute targets, so two GMs applying the same message
//! converge on the same state.
//!
//! Notices (`refreshAll`, `refreshQuest`, `userCantOpenQuest`) are never
//! handled: every receiver acts on them.
//!
//! ## Versioning Policy
//!
//! - New message kinds can be added (receivers ignore kinds they don't know)
//! - Renaming a kind or a payload field is a breaking change

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use questlog_domain::QuestStatus;

pub const QUEST_DELETED: &str = "questDeleted";
pub const SET_QUEST_STATUS: &str = "setQuestStatus";
pub const SET_PRIMARY_QUEST: &str = "setPrimaryQuest";
pub const DROP_QUEST_REWARD: &str = "dropQuestReward";
pub const REFRESH_ALL: &str = "refreshAll";
pub const REFRESH_QUEST: &str = "refreshQuest";
pub const USER_CANT_OPEN_QUEST: &str = "userCantOpenQuest";

/// Raw broadcast unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("malformed '{kind}' payload: {source}")]
    Malformed {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

// =============================================================================
// Payloads
// =============================================================================

/// A quest was deleted.
///
/// Idempotent: deleting an id that no longer exists is a no-op. When
/// `handled` is false a GM performs the cascade delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestDeletedData {
    pub quest_id: Uuid,
    /// Former parent and subquests whose views embed the deleted quest
    #[serde(default)]
    pub related_ids: Vec<Uuid>,
    #[serde(default)]
    pub handled: bool,
}

/// Move a quest to `target`.
///
/// Idempotent: applying the same target twice leaves the quest unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetQuestStatusData {
    pub quest_id: Uuid,
    pub target: QuestStatus,
    #[serde(default)]
    pub handled: bool,
}

/// Pin `quest_id` as the primary quest, or clear it with `None`.
///
/// Idempotent: the setting is overwritten with an absolute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPrimaryQuestData {
    #[serde(default)]
    pub quest_id: Option<Uuid>,
    #[serde(default)]
    pub handled: bool,
}

/// Transfer a reward from a quest to an actor.
///
/// Remove-if-present: the reward leaves the quest at most once, so a racing
/// duplicate finds nothing to remove and does nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropQuestRewardData {
    pub quest_id: Uuid,
    pub reward_id: Uuid,
    /// Host reference of the receiving actor
    pub actor: String,
    pub user_id: Uuid,
    #[serde(default)]
    pub handled: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RefreshAllData {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshQuestData {
    pub quest_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCantOpenQuestData {
    pub quest_id: Uuid,
    pub user_name: String,
}

// =============================================================================
// Typed messages
// =============================================================================

/// Typed view of an [`Envelope`].
#[derive(Debug, Clone, PartialEq)]
pub enum SyncMessage {
    QuestDeleted(QuestDeletedData),
    SetQuestStatus(SetQuestStatusData),
    SetPrimaryQuest(SetPrimaryQuestData),
    DropQuestReward(DropQuestRewardData),
    RefreshAll,
    RefreshQuest(RefreshQuestData),
    UserCantOpenQuest(UserCantOpenQuestData),
}

impl SyncMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            SyncMessage::QuestDeleted(_) => QUEST_DELETED,
            SyncMessage::SetQuestStatus(_) => SET_QUEST_STATUS,
            SyncMessage::SetPrimaryQuest(_) => SET_PRIMARY_QUEST,
            SyncMessage::DropQuestReward(_) => DROP_QUEST_REWARD,
            SyncMessage::RefreshAll => REFRESH_ALL,
            SyncMessage::RefreshQuest(_) => REFRESH_QUEST,
            SyncMessage::UserCantOpenQuest(_) => USER_CANT_OPEN_QUEST,
        }
    }

    /// Notices are acted on by every receiver.
    pub fn is_notice(&self) -> bool {
        matches!(
            self,
            SyncMessage::RefreshAll
                | SyncMessage::RefreshQuest(_)
                | SyncMessage::UserCantOpenQuest(_)
        )
    }

    /// `Some(handled)` for mutations, `None` for notices.
    pub fn handled(&self) -> Option<bool> {
        match self {
            SyncMessage::QuestDeleted(d) => Some(d.handled),
            SyncMessage::SetQuestStatus(d) => Some(d.handled),
            SyncMessage::SetPrimaryQuest(d) => Some(d.handled),
            SyncMessage::DropQuestReward(d) => Some(d.handled),
            _ => None,
        }
    }

    pub fn to_envelope(&self) -> Result<Envelope, SyncError> {
        let payload = match self {
            SyncMessage::QuestDeleted(d) => to_payload(self.kind(), d)?,
            SyncMessage::SetQuestStatus(d) => to_payload(self.kind(), d)?,
            SyncMessage::SetPrimaryQuest(d) => to_payload(self.kind(), d)?,
            SyncMessage::DropQuestReward(d) => to_payload(self.kind(), d)?,
            SyncMessage::RefreshAll => to_payload(self.kind(), &RefreshAllData::default())?,
            SyncMessage::RefreshQuest(d) => to_payload(self.kind(), d)?,
            SyncMessage::UserCantOpenQuest(d) => to_payload(self.kind(), d)?,
        };
        Ok(Envelope {
            kind: self.kind().to_string(),
            payload,
        })
    }

    /// Decode an envelope. Unknown kinds yield `Ok(None)` so newer peers can
    /// add message kinds without breaking older ones.
    pub fn from_envelope(envelope: &Envelope) -> Result<Option<Self>, SyncError> {
        let kind = envelope.kind.as_str();
        let message = match kind {
            QUEST_DELETED => SyncMessage::QuestDeleted(from_payload(kind, &envelope.payload)?),
            SET_QUEST_STATUS => SyncMessage::SetQuestStatus(from_payload(kind, &envelope.payload)?),
            SET_PRIMARY_QUEST => {
                SyncMessage::SetPrimaryQuest(from_payload(kind, &envelope.payload)?)
            }
            DROP_QUEST_REWARD => {
                SyncMessage::DropQuestReward(from_payload(kind, &envelope.payload)?)
            }
            REFRESH_ALL => SyncMessage::RefreshAll,
            REFRESH_QUEST => SyncMessage::RefreshQuest(from_payload(kind, &envelope.payload)?),
            USER_CANT_OPEN_QUEST => {
                SyncMessage::UserCantOpenQuest(from_payload(kind, &envelope.payload)?)
            }
            _ => return Ok(None),
        };
        Ok(Some(message))
    }
}

fn to_payload<T: Serialize>(kind: &str, data: &T) -> Result<serde_json::Value, SyncError> {
    serde_json::to_value(data).map_err(|source| SyncError::Malformed {
        kind: kind.to_string(),
        source,
    })
}

fn from_payload<T: DeserializeOwned>(kind: &str, payload: &serde_json::Value) -> Result<T, SyncError> {
    serde_json::from_value(payload.clone()).map_err(|source| SyncError::Malformed {
        kind: kind.to_string(),
        source,
    })
}
