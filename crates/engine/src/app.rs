//! Client composition.
//!
//! One `App` per connected user. It owns the user's quest cache and relay,
//! wires them to the shared store, sync channel and settings, and drives the
//! notification loop that keeps the cache current.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

use questlog_domain::{Caller, Quest, QuestId, QuestSettings, QuestStatus, Reward, RewardId};
use questlog_shared::Envelope;

use crate::api::{Dispatch, Relay, ViewEvent};
use crate::entities::Quests;
use crate::infrastructure::ports::{ClockPort, DocumentStore, SettingsPort, StoreChange, SyncChannel};
use crate::stores::quest_cache::Comparator;
use crate::stores::{CacheEvent, QuestCache, QuestEntry};
use crate::use_cases::quest::{
    CreateQuest, DeleteOutcome, DeleteQuest, DropReward, NewQuest, SaveQuest, SetPrimaryQuest,
    SetQuestStatus,
};
use crate::use_cases::{QuestError, QuestUseCases};

/// How long a create waits for its own store notification.
pub const CREATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Ports shared by every client of a world.
#[derive(Clone)]
pub struct Ports {
    pub store: Arc<dyn DocumentStore>,
    pub channel: Arc<dyn SyncChannel>,
    pub settings: Arc<dyn SettingsPort>,
    pub clock: Arc<dyn ClockPort>,
}

/// A connected client.
pub struct App {
    pub caller: Caller,
    pub cache: Arc<QuestCache>,
    pub relay: Arc<Relay>,
    pub use_cases: Arc<QuestUseCases>,
    ports: Ports,
    subscribed: AtomicBool,
    run_task: Mutex<Option<JoinHandle<()>>>,
}

impl App {
    /// Wire up a client. Nothing is read or subscribed until [`App::start`].
    pub fn new(caller: Caller, ports: Ports) -> Self {
        let quests = Arc::new(Quests::new(Arc::clone(&ports.store)));
        let cache = Arc::new(QuestCache::new(
            caller.clone(),
            Arc::clone(&quests),
            Arc::clone(&ports.settings),
        ));

        let use_cases = Arc::new(QuestUseCases {
            create: Arc::new(CreateQuest::new(
                Arc::clone(&quests),
                Arc::clone(&cache),
                Arc::clone(&ports.settings),
                Arc::clone(&ports.clock),
                CREATE_TIMEOUT,
            )),
            delete: Arc::new(DeleteQuest::new(Arc::clone(&quests))),
            status: Arc::new(SetQuestStatus::new(
                Arc::clone(&quests),
                Arc::clone(&ports.clock),
            )),
            primary: Arc::new(SetPrimaryQuest::new(Arc::clone(&ports.settings))),
            drop_reward: Arc::new(DropReward::new(Arc::clone(&quests))),
            save: Arc::new(SaveQuest::new(quests, Arc::clone(&ports.settings))),
        });

        let relay = Arc::new(Relay::new(
            caller.clone(),
            Arc::clone(&cache),
            Arc::clone(&use_cases),
            Arc::clone(&ports.channel),
            Arc::clone(&ports.settings),
        ));

        Self {
            caller,
            cache,
            relay,
            use_cases,
            ports,
            subscribed: AtomicBool::new(false),
            run_task: Mutex::new(None),
        }
    }

    /// Subscribe to the store, channel and settings, start the notification
    /// loop and build the cache. Subscriptions happen once per client; later
    /// calls only rebuild the cache.
    pub async fn start(&self) {
        if !self.subscribed.swap(true, Ordering::SeqCst) {
            let store_rx = self.ports.store.subscribe();
            let channel_rx = self.ports.channel.subscribe();
            let settings_rx = self.ports.settings.subscribe();

            let handle = tokio::spawn(run(
                Arc::clone(&self.cache),
                Arc::clone(&self.relay),
                store_rx,
                channel_rx,
                settings_rx,
            ));
            *self.run_task.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
            tracing::debug!(user = %self.caller.name, "Client subscribed");
        }

        self.cache.init().await;
    }

    /// Stop the notification loop.
    pub fn shutdown(&self) {
        if let Some(handle) = self.run_task.lock().unwrap_or_else(|e| e.into_inner()).take() {
            handle.abort();
            tracing::debug!(user = %self.caller.name, "Client stopped");
        }
    }

    pub fn settings(&self) -> QuestSettings {
        self.ports.settings.current()
    }

    pub fn subscribe_cache(&self) -> broadcast::Receiver<CacheEvent> {
        self.cache.subscribe()
    }

    pub fn subscribe_views(&self) -> broadcast::Receiver<ViewEvent> {
        self.relay.subscribe()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub async fn create_quest(
        &self,
        data: NewQuest,
        parent: Option<QuestId>,
    ) -> Result<Option<Quest>, QuestError> {
        self.use_cases.create.execute(&self.caller, data, parent).await
    }

    pub async fn save_quest(&self, quest: &Quest) -> Result<(), QuestError> {
        self.use_cases.save.execute(&self.caller, quest).await?;
        self.relay.refresh_quests(&quest.related_ids());
        Ok(())
    }

    pub async fn delete_quest(&self, id: QuestId) -> Result<Option<DeleteOutcome>, QuestError> {
        self.relay.delete_quest(id).await
    }

    pub async fn set_status(&self, id: QuestId, target: QuestStatus) -> Result<Dispatch, QuestError> {
        self.relay.set_status(id, target).await
    }

    pub async fn set_primary(&self, id: Option<QuestId>) -> Result<Dispatch, QuestError> {
        self.relay.set_primary(id).await
    }

    pub async fn drop_reward(
        &self,
        quest_id: QuestId,
        reward_id: RewardId,
        actor: &str,
    ) -> Result<Dispatch, QuestError> {
        self.relay.drop_reward(quest_id, reward_id, actor).await
    }

    /// Reward currently on a cached quest.
    pub async fn reward(&self, quest_id: QuestId, reward_id: RewardId) -> Option<Reward> {
        let quest = self.cache.get_quest(quest_id).await?;
        quest.reward(reward_id).cloned()
    }

    pub async fn open_quest(&self, id: QuestId) -> Option<QuestEntry> {
        self.relay.open_quest(id).await
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get_quest(&self, id: QuestId) -> Option<Quest> {
        self.cache.get_quest(id).await
    }

    pub async fn get_entry(&self, id: QuestId) -> Option<QuestEntry> {
        self.cache.get_entry(id).await
    }

    pub async fn count(&self, status: Option<QuestStatus>) -> usize {
        self.cache.count(status).await
    }

    pub async fn sorted_all(
        &self,
        comparators: &HashMap<QuestStatus, Box<Comparator>>,
    ) -> BTreeMap<QuestStatus, Vec<QuestEntry>> {
        self.cache.sorted_all(comparators).await
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Notification loop. Store changes are applied one at a time, so the cache
/// sees them in delivery order.
async fn run(
    cache: Arc<QuestCache>,
    relay: Arc<Relay>,
    mut store_rx: mpsc::UnboundedReceiver<StoreChange>,
    mut channel_rx: mpsc::UnboundedReceiver<Envelope>,
    mut settings_rx: watch::Receiver<QuestSettings>,
) {
    let mut previous = settings_rx.borrow().clone();

    loop {
        tokio::select! {
            change = store_rx.recv() => {
                let Some(change) = change else { break };
                if let Some(deletion) = cache.apply(change).await {
                    relay.on_deleted(deletion);
                }
            }
            envelope = channel_rx.recv() => {
                let Some(envelope) = envelope else { break };
                relay.handle_envelope(envelope).await;
            }
            changed = settings_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let next = settings_rx.borrow_and_update().clone();
                if previous.visibility_changed(&next) {
                    cache.consistency_check().await;
                } else {
                    cache.rebuild_all().await;
                }
                previous = next;
                relay.emit(ViewEvent::RefreshAll);
            }
        }
    }

    tracing::debug!(user = %cache.caller().name, "Notification loop ended");
}
