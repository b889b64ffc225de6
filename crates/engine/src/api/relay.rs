//! Sync relay.
//!
//! Every privileged mutation follows one shape:
//! 1. Apply locally when the caller is allowed to, and mark it `handled`.
//! 2. Broadcast `{type, payload: {...data, handled}}` to every other client.
//! 3. Receivers of a handled message only refresh their views; the first GM
//!    to receive an unhandled one applies it.
//!
//! Mutations are absolute targets, so two GMs applying the same request
//! end in the same state.

use std::sync::Arc;

use tokio::sync::broadcast;
use uuid::Uuid;

use questlog_domain::{can_edit, Caller, QuestId, QuestStatus, RewardId, UserId};
use questlog_shared::{
    DropQuestRewardData, Envelope, QuestDeletedData, RefreshQuestData, SetPrimaryQuestData,
    SetQuestStatusData, SyncMessage, UserCantOpenQuestData,
};

use crate::infrastructure::ports::{SettingsPort, SyncChannel};
use crate::stores::{Deletion, QuestCache, QuestEntry};
use crate::use_cases::quest::{DeleteOutcome, QuestError, QuestUseCases};

const VIEW_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warn,
}

/// Instructions for the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    RefreshAll,
    Refresh(Vec<QuestId>),
    /// Close any open view of a deleted quest
    Close(QuestId),
    Notice { level: NoticeLevel, message: String },
}

/// How a request was dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Applied to the store by this client
    Applied,
    /// Broadcast for a GM to apply
    Relayed,
    /// Caller may not make the request; nothing was sent
    Refused,
}

pub struct Relay {
    caller: Caller,
    cache: Arc<QuestCache>,
    use_cases: Arc<QuestUseCases>,
    channel: Arc<dyn SyncChannel>,
    settings: Arc<dyn SettingsPort>,
    views: broadcast::Sender<ViewEvent>,
}

impl Relay {
    pub fn new(
        caller: Caller,
        cache: Arc<QuestCache>,
        use_cases: Arc<QuestUseCases>,
        channel: Arc<dyn SyncChannel>,
        settings: Arc<dyn SettingsPort>,
    ) -> Self {
        let (views, _) = broadcast::channel(VIEW_CAPACITY);
        Self {
            caller,
            cache,
            use_cases,
            channel,
            settings,
            views,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.views.subscribe()
    }

    pub fn emit(&self, event: ViewEvent) {
        if self.views.send(event).is_err() {
            tracing::trace!("No view subscribers");
        }
    }

    fn broadcast(&self, message: SyncMessage) -> Result<(), QuestError> {
        let envelope = message.to_envelope()?;
        self.channel.send(envelope)?;
        tracing::debug!(kind = message.kind(), handled = ?message.handled(), "Sync message sent");
        Ok(())
    }

    /// Broadcast a notice without failing the caller's operation.
    fn notify(&self, message: SyncMessage) {
        if let Err(e) = self.broadcast(message) {
            tracing::warn!(error = %e, "Failed to broadcast notice");
        }
    }

    async fn editable(&self, id: QuestId) -> Option<bool> {
        let quest = self.cache.get_quest(id).await?;
        Some(can_edit(&quest, &self.caller, &self.settings.current()))
    }

    // =========================================================================
    // Outbound requests
    // =========================================================================

    pub async fn delete_quest(&self, id: QuestId) -> Result<Option<DeleteOutcome>, QuestError> {
        let Some(editable) = self.editable(id).await else {
            return Ok(None);
        };

        if self.caller.is_gm() {
            let outcome = self.use_cases.delete.execute(id).await?;
            if let Some(outcome) = &outcome {
                self.broadcast(SyncMessage::QuestDeleted(QuestDeletedData {
                    quest_id: id.to_uuid(),
                    related_ids: outcome.saved.iter().map(|q| q.to_uuid()).collect(),
                    handled: true,
                }))?;
            }
            return Ok(outcome);
        }

        if editable {
            // The cascade touches quests the editor may not own
            let related: Vec<Uuid> = self
                .cache
                .get_entry(id)
                .await
                .map(|e| e.related().iter().filter(|r| **r != id).map(|r| r.to_uuid()).collect())
                .unwrap_or_default();
            self.broadcast(SyncMessage::QuestDeleted(QuestDeletedData {
                quest_id: id.to_uuid(),
                related_ids: related,
                handled: false,
            }))?;
        } else {
            tracing::debug!(quest_id = %id, "Delete refused");
        }
        Ok(None)
    }

    pub async fn set_status(&self, id: QuestId, target: QuestStatus) -> Result<Dispatch, QuestError> {
        let Some(editable) = self.editable(id).await else {
            return Ok(Dispatch::Refused);
        };

        let handled = if editable {
            self.use_cases.status.execute(id, target).await?;
            true
        } else if target == QuestStatus::Active || self.settings.current().allow_player_accept {
            false
        } else {
            tracing::debug!(quest_id = %id, target = %target, "Status change refused");
            return Ok(Dispatch::Refused);
        };

        self.broadcast(SyncMessage::SetQuestStatus(SetQuestStatusData {
            quest_id: id.to_uuid(),
            target,
            handled,
        }))?;
        Ok(if handled { Dispatch::Applied } else { Dispatch::Relayed })
    }

    pub async fn set_primary(&self, quest_id: Option<QuestId>) -> Result<Dispatch, QuestError> {
        let handled = self.caller.is_gm();
        if handled {
            self.use_cases.primary.execute(quest_id).await?;
        }
        self.broadcast(SyncMessage::SetPrimaryQuest(SetPrimaryQuestData {
            quest_id: quest_id.map(|q| q.to_uuid()),
            handled,
        }))?;
        Ok(if handled { Dispatch::Applied } else { Dispatch::Relayed })
    }

    pub async fn drop_reward(
        &self,
        quest_id: QuestId,
        reward_id: RewardId,
        actor: &str,
    ) -> Result<Dispatch, QuestError> {
        let Some(entry) = self.cache.get_entry(quest_id).await else {
            return Ok(Dispatch::Refused);
        };
        let Some(reward) = entry.quest().reward(reward_id) else {
            return Ok(Dispatch::Refused);
        };
        if reward.locked && !self.caller.is_gm() {
            self.emit(ViewEvent::Notice {
                level: NoticeLevel::Warn,
                message: format!("{} is locked and cannot be taken", reward.name()),
            });
            return Ok(Dispatch::Refused);
        }

        let handled = entry.can_edit();
        if handled {
            self.use_cases
                .drop_reward
                .execute(quest_id, reward_id, actor, self.caller.is_gm())
                .await?;
        }
        self.broadcast(SyncMessage::DropQuestReward(DropQuestRewardData {
            quest_id: quest_id.to_uuid(),
            reward_id: reward_id.to_uuid(),
            actor: actor.to_string(),
            user_id: self.caller.user_id.to_uuid(),
            handled,
        }))?;
        Ok(if handled { Dispatch::Applied } else { Dispatch::Relayed })
    }

    /// Entry for an observable quest; otherwise posts a notice locally and
    /// tells the GM someone tried.
    pub async fn open_quest(&self, id: QuestId) -> Option<QuestEntry> {
        if let Some(entry) = self.cache.get_entry(id).await {
            return Some(entry);
        }
        self.emit(ViewEvent::Notice {
            level: NoticeLevel::Warn,
            message: "You do not have permission to view this quest".to_string(),
        });
        self.notify(SyncMessage::UserCantOpenQuest(UserCantOpenQuestData {
            quest_id: id.to_uuid(),
            user_name: self.caller.name.clone(),
        }));
        None
    }

    pub fn refresh_quests(&self, ids: &[QuestId]) {
        self.emit(ViewEvent::Refresh(ids.to_vec()));
        self.notify(SyncMessage::RefreshQuest(RefreshQuestData {
            quest_ids: ids.iter().map(|q| q.to_uuid()).collect(),
        }));
    }

    pub fn refresh_all(&self) {
        self.emit(ViewEvent::RefreshAll);
        self.notify(SyncMessage::RefreshAll);
    }

    // =========================================================================
    // Inbound
    // =========================================================================

    /// Local views after the cache processed a delete notification.
    pub fn on_deleted(&self, deletion: Deletion) {
        self.emit(ViewEvent::Close(deletion.id));
        if !deletion.related.is_empty() {
            self.emit(ViewEvent::Refresh(deletion.related));
        }
    }

    pub async fn handle_envelope(&self, envelope: Envelope) {
        let message = match SyncMessage::from_envelope(&envelope) {
            Ok(Some(message)) => message,
            Ok(None) => {
                tracing::debug!(kind = %envelope.kind, "Ignoring unknown sync message");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed sync message");
                return;
            }
        };

        if let Err(e) = self.handle_message(message).await {
            tracing::warn!(error = %e, "Failed to apply relayed request");
        }
    }

    async fn handle_message(&self, message: SyncMessage) -> Result<(), QuestError> {
        let is_gm = self.caller.is_gm();
        match message {
            SyncMessage::QuestDeleted(data) => {
                let id = QuestId::from_uuid(data.quest_id);
                if data.handled {
                    let related: Vec<QuestId> =
                        data.related_ids.into_iter().map(QuestId::from_uuid).collect();
                    if !related.is_empty() {
                        self.emit(ViewEvent::Refresh(related));
                    }
                } else if is_gm {
                    self.use_cases.delete.execute(id).await?;
                }
            }
            SyncMessage::SetQuestStatus(data) => {
                let id = QuestId::from_uuid(data.quest_id);
                if data.handled {
                    self.emit(ViewEvent::Refresh(vec![id]));
                } else if is_gm {
                    self.use_cases.status.execute(id, data.target).await?;
                }
            }
            SyncMessage::SetPrimaryQuest(data) => {
                if data.handled {
                    self.emit(ViewEvent::RefreshAll);
                } else if is_gm {
                    self.use_cases
                        .primary
                        .execute(data.quest_id.map(QuestId::from_uuid))
                        .await?;
                }
            }
            SyncMessage::DropQuestReward(data) => {
                let quest_id = QuestId::from_uuid(data.quest_id);
                if data.handled {
                    self.emit(ViewEvent::Refresh(vec![quest_id]));
                } else if is_gm {
                    tracing::debug!(
                        quest_id = %quest_id,
                        user_id = %UserId::from_uuid(data.user_id),
                        "Applying relayed reward drop"
                    );
                    self.use_cases
                        .drop_reward
                        .execute(quest_id, RewardId::from_uuid(data.reward_id), &data.actor, false)
                        .await?;
                }
            }
            SyncMessage::RefreshAll => self.emit(ViewEvent::RefreshAll),
            SyncMessage::RefreshQuest(data) => self.emit(ViewEvent::Refresh(
                data.quest_ids.into_iter().map(QuestId::from_uuid).collect(),
            )),
            SyncMessage::UserCantOpenQuest(data) => {
                if is_gm {
                    self.emit(ViewEvent::Notice {
                        level: NoticeLevel::Warn,
                        message: cant_open_message(&data.user_name, data.quest_id),
                    });
                }
            }
        }
        Ok(())
    }
}

fn cant_open_message(user_name: &str, quest_id: Uuid) -> String {
    format!("{user_name} tried to open quest {quest_id} without permission")
}
