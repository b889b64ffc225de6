//! Observable-quest cache.
//!
//! Per-client mirror of the quest records the local user can observe,
//! partitioned by status. Store notifications are applied through the
//! `handle_*` methods by the client run loop, one at a time. Lifecycle
//! events go out on a broadcast channel for the rendering layer.
//!
//! Records that are not quests, or that the user cannot observe, are
//! tracked as stubs so the rendering layer can still resolve their ids.

mod collection;
mod enrich;
mod entry;
mod events;
mod partition;

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, oneshot, RwLock};

use questlog_domain::{
    can_edit, is_observable, Caller, PayloadError, Quest, QuestId, QuestSettings, QuestStatus,
};

use crate::entities::Quests;
use crate::infrastructure::ports::{SettingsPort, StoreChange, StoreRecord};

use collection::Collections;
use partition::Partition;

pub use enrich::{EnrichedQuest, QuestSummary, RewardView};
pub use entry::{EntryFlags, QuestEntry};
pub use events::CacheEvent;

const EVENT_CAPACITY: usize = 256;

/// Ordering used by `sorted` and `sorted_all`.
pub type Comparator = dyn Fn(&QuestEntry, &QuestEntry) -> Ordering + Send + Sync;

/// Result of a delete notification for a cached quest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deletion {
    pub id: QuestId,
    /// Former parent and subquests whose views embed the deleted quest
    pub related: Vec<QuestId>,
}

#[derive(Default)]
struct CacheState {
    partition: Partition,
    collections: Collections,
    stubs: HashSet<QuestId>,
    waiters: HashMap<QuestId, Vec<oneshot::Sender<()>>>,
}

impl CacheState {
    fn clear(&mut self) {
        self.partition.clear();
        self.collections.invalidate_all();
        self.stubs.clear();
    }

    fn insert(&mut self, entry: QuestEntry) {
        let id = entry.id();
        let status = entry.status();
        match self.partition.insert(entry) {
            Some(previous) if previous.status() == status => {}
            Some(previous) => {
                self.collections.invalidate(previous.status());
                self.collections.invalidate(status);
            }
            None => self.collections.invalidate(status),
        }
        self.stubs.remove(&id);
    }

    fn remove(&mut self, id: QuestId) -> Option<QuestEntry> {
        let removed = self.partition.remove(id)?;
        self.collections.invalidate(removed.status());
        Some(removed)
    }

    fn relocate(&mut self, id: QuestId) -> Option<QuestStatus> {
        let from = self.partition.relocate(id)?;
        self.collections.invalidate(from);
        if let Some(to) = self.partition.status_of(id) {
            self.collections.invalidate(to);
        }
        Some(from)
    }

    fn stub(&mut self, id: QuestId) {
        self.stubs.insert(id);
    }

    fn hydrate(&mut self, id: QuestId, caller: &Caller, settings: &QuestSettings) -> bool {
        let Some(entry) = self.partition.get(id) else {
            return false;
        };
        let flags = EntryFlags::compute(entry.quest(), caller, settings);
        let enrich = EnrichedQuest::build(entry.quest(), &flags, &self.partition, settings);
        match self.partition.get_mut(id) {
            Some(entry) => {
                entry.hydrate(flags, enrich);
                true
            }
            None => false,
        }
    }

    fn hydrate_many(
        &mut self,
        ids: impl IntoIterator<Item = QuestId>,
        caller: &Caller,
        settings: &QuestSettings,
    ) {
        let mut seen = HashSet::new();
        for id in ids {
            if seen.insert(id) {
                self.hydrate(id, caller, settings);
            }
        }
    }

    fn hydrate_all(&mut self, caller: &Caller, settings: &QuestSettings) {
        for id in self.partition.ids() {
            self.hydrate(id, caller, settings);
        }
    }

    fn wake(&mut self, id: QuestId) {
        for tx in self.waiters.remove(&id).unwrap_or_default() {
            let _ = tx.send(());
        }
    }

    fn entry_event(&self, id: QuestId, wrap: impl FnOnce(Box<QuestEntry>) -> CacheEvent) -> Option<CacheEvent> {
        self.partition.get(id).map(|e| wrap(Box::new(e.clone())))
    }
}

pub struct QuestCache {
    caller: Caller,
    quests: Arc<Quests>,
    settings: Arc<dyn SettingsPort>,
    state: RwLock<CacheState>,
    events: broadcast::Sender<CacheEvent>,
}

impl QuestCache {
    pub fn new(caller: Caller, quests: Arc<Quests>, settings: Arc<dyn SettingsPort>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            caller,
            quests,
            settings,
            state: RwLock::new(CacheState::default()),
            events,
        }
    }

    pub fn caller(&self) -> &Caller {
        &self.caller
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: CacheEvent) {
        tracing::debug!(quest_id = %event.quest_id(), event = event.name(), "Cache event");
        if self.events.send(event).is_err() {
            tracing::trace!("No cache event subscribers");
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Rebuild the cache from the store. Never fails: a missing collection or
    /// store error leaves the cache empty.
    pub async fn init(&self) {
        let settings = self.settings.current();
        // Hold the lock across enumeration so notifications queued meanwhile
        // are applied on top of the rebuilt state
        let mut state = self.state.write().await;
        let listed = self.quests.list(&settings.collection_name).await;
        state.clear();

        let records = match listed {
            Ok(records) => records,
            Err(e) if e.is_not_found() => {
                if self.caller.is_gm() {
                    tracing::warn!(
                        collection = %settings.collection_name,
                        "Quest collection missing; starting with an empty quest log"
                    );
                } else {
                    tracing::debug!(collection = %settings.collection_name, "Quest collection missing");
                }
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to enumerate quest records");
                return;
            }
        };

        for record in records {
            match Quests::parse_record(&record) {
                Ok(quest) if is_observable(&quest, &self.caller, &settings) => {
                    state.insert(QuestEntry::new(quest));
                }
                Ok(_) => state.stub(record.id),
                Err(e) => {
                    log_payload_error(record.id, &e);
                    state.stub(record.id);
                }
            }
        }

        // Projections read linked entries, so hydrate only once all are in
        state.hydrate_all(&self.caller, &settings);
        state.collections.invalidate_all();

        tracing::info!(
            user = %self.caller.name,
            quests = state.partition.len(),
            stubs = state.stubs.len(),
            "Quest cache initialized"
        );
    }

    /// Apply one store notification. Returns the deletion details when a
    /// cached quest was deleted.
    pub async fn apply(&self, change: StoreChange) -> Option<Deletion> {
        match change {
            StoreChange::Created(record) => {
                self.handle_created(record).await;
                None
            }
            StoreChange::Updated {
                record,
                flags_changed,
            } => {
                self.handle_updated(record, flags_changed).await;
                None
            }
            StoreChange::Deleted(id) => self.handle_deleted(id).await,
        }
    }

    pub async fn handle_created(&self, record: StoreRecord) {
        let id = record.id;
        let settings = self.settings.current();

        let quest = match Quests::parse_record(&record) {
            Ok(quest) => quest,
            Err(e) => {
                log_payload_error(id, &e);
                let mut state = self.state.write().await;
                state.stub(id);
                state.wake(id);
                return;
            }
        };

        if self.state.read().await.partition.contains(id) {
            tracing::debug!(quest_id = %id, "Create for cached quest, applying as update");
            return self.handle_updated(record, true).await;
        }

        let subquests = quest.subquests().to_vec();
        let editable = can_edit(&quest, &self.caller, &settings);

        let event = {
            let mut state = self.state.write().await;
            if !is_observable(&quest, &self.caller, &settings) {
                state.stub(id);
                state.wake(id);
                return;
            }
            let related = quest.related_ids();
            state.insert(QuestEntry::new(quest));
            state.hydrate_many(related, &self.caller, &settings);
            state.wake(id);
            state.entry_event(id, CacheEvent::Created)
        };
        if let Some(event) = event {
            self.emit(event);
        }

        if editable && !subquests.is_empty() {
            self.prune_missing_subquests(id, &subquests).await;
        }
    }

    /// Drop subquest ids whose records are gone and persist the corrected
    /// list. The resulting update notification converges the cache.
    async fn prune_missing_subquests(&self, id: QuestId, subquests: &[QuestId]) {
        let mut missing = Vec::new();
        for sub in subquests {
            match self.quests.exists(*sub).await {
                Ok(true) => {}
                Ok(false) => missing.push(*sub),
                Err(e) => {
                    tracing::warn!(quest_id = %id, error = %e, "Could not verify subquests");
                    return;
                }
            }
        }
        if missing.is_empty() {
            return;
        }

        let mut quest = match self.quests.load(id).await {
            Ok(Some(quest)) => quest,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(quest_id = %id, error = %e, "Could not reload quest");
                return;
            }
        };
        quest.retain_subquests(|sub| !missing.contains(&sub));
        match self.quests.save(&quest).await {
            Ok(()) => tracing::info!(
                quest_id = %id,
                dropped = missing.len(),
                "Removed missing subquests"
            ),
            Err(e) => tracing::warn!(quest_id = %id, error = %e, "Failed to persist subquest list"),
        }
    }

    pub async fn handle_updated(&self, record: StoreRecord, flags_changed: bool) {
        let id = record.id;
        let settings = self.settings.current();
        let parsed = Quests::parse_record(&record);

        let mut events = Vec::new();
        {
            let mut state = self.state.write().await;
            let cached = state.partition.contains(id);

            match parsed {
                Ok(quest) => {
                    let observable = is_observable(&quest, &self.caller, &settings);
                    match (cached, observable) {
                        (true, true) => {
                            let old_related = state
                                .partition
                                .get(id)
                                .map(|e| e.related().to_vec())
                                .unwrap_or_default();
                            let new_related = quest.related_ids();
                            if let Some(entry) = state.partition.get_mut(id) {
                                entry.replace_quest(quest);
                            }
                            let previous_status = state.relocate(id);
                            state.hydrate_many(
                                new_related.into_iter().chain(old_related),
                                &self.caller,
                                &settings,
                            );
                            events.extend(state.entry_event(id, |entry| CacheEvent::Updated {
                                entry,
                                flags_changed,
                                previous_status,
                            }));
                        }
                        (true, false) => {
                            if let Some(removed) = state.remove(id) {
                                state.hydrate_many(
                                    removed.related().iter().copied(),
                                    &self.caller,
                                    &settings,
                                );
                            }
                            state.stub(id);
                            events.push(CacheEvent::Removed(id));
                        }
                        (false, true) => {
                            let related = quest.related_ids();
                            state.insert(QuestEntry::new(quest));
                            state.hydrate_many(related, &self.caller, &settings);
                            state.wake(id);
                            events.extend(state.entry_event(id, CacheEvent::Added));
                        }
                        (false, false) => state.stub(id),
                    }
                }
                Err(e) => {
                    log_payload_error(id, &e);
                    if let Some(removed) = state.remove(id) {
                        state.hydrate_many(removed.related().iter().copied(), &self.caller, &settings);
                        events.push(CacheEvent::Removed(id));
                    }
                    state.stub(id);
                }
            }
        }

        for event in events {
            self.emit(event);
        }
    }

    pub async fn handle_deleted(&self, id: QuestId) -> Option<Deletion> {
        let settings = self.settings.current();
        let related = {
            let mut state = self.state.write().await;
            state.stubs.remove(&id);
            let removed = state.remove(id)?;
            let related: Vec<QuestId> = removed
                .related()
                .iter()
                .copied()
                .filter(|r| *r != id)
                .collect();
            state.hydrate_many(related.iter().copied(), &self.caller, &settings);
            related
        };

        self.emit(CacheEvent::Deleted(id));
        Some(Deletion { id, related })
    }

    /// Re-evaluate every stored record after a settings change that affects
    /// observability, then rebuild every projection.
    pub async fn consistency_check(&self) {
        let settings = self.settings.current();
        let mut state = self.state.write().await;
        let records = match self.quests.list(&settings.collection_name).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "Consistency check could not enumerate quests");
                return;
            }
        };

        let mut added = Vec::new();
        let mut removed = Vec::new();
        let mut seen = HashSet::with_capacity(records.len());

        for record in records {
            let id = record.id;
            seen.insert(id);
            let cached = state.partition.contains(id);
            let quest = match Quests::parse_record(&record) {
                Ok(quest) => quest,
                Err(_) => {
                    if state.remove(id).is_some() {
                        removed.push(id);
                    }
                    state.stub(id);
                    continue;
                }
            };

            match (cached, is_observable(&quest, &self.caller, &settings)) {
                (false, true) => {
                    state.insert(QuestEntry::new(quest));
                    added.push(id);
                }
                (true, true) => {
                    if let Some(entry) = state.partition.get_mut(id) {
                        entry.replace_quest(quest);
                    }
                    state.relocate(id);
                }
                (true, false) => {
                    state.remove(id);
                    state.stub(id);
                    removed.push(id);
                }
                (false, false) => state.stub(id),
            }
        }

        for id in state.partition.ids() {
            if !seen.contains(&id) {
                state.remove(id);
                removed.push(id);
            }
        }

        state.hydrate_all(&self.caller, &settings);

        let events: Vec<CacheEvent> = added
            .iter()
            .filter_map(|id| state.entry_event(*id, CacheEvent::Added))
            .chain(removed.iter().map(|id| CacheEvent::Removed(*id)))
            .collect();
        drop(state);

        tracing::info!(
            added = added.len(),
            removed = removed.len(),
            "Quest cache consistency check complete"
        );
        for event in events {
            self.emit(event);
        }
    }

    /// Rebuild every projection without touching membership.
    pub async fn rebuild_all(&self) {
        let settings = self.settings.current();
        self.state.write().await.hydrate_all(&self.caller, &settings);
    }

    /// Wait until the create notification for `id` has been processed.
    /// Returns false on timeout.
    pub async fn wait_for(&self, id: QuestId, timeout: Duration) -> bool {
        let rx = {
            let mut state = self.state.write().await;
            if state.partition.contains(id) || state.stubs.contains(&id) {
                return true;
            }
            let (tx, rx) = oneshot::channel();
            state.waiters.entry(id).or_default().push(tx);
            rx
        };

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(())) => true,
            _ => {
                let mut state = self.state.write().await;
                if let Some(waiters) = state.waiters.get_mut(&id) {
                    waiters.retain(|tx| !tx.is_closed());
                    if waiters.is_empty() {
                        state.waiters.remove(&id);
                    }
                }
                false
            }
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get_quest(&self, id: QuestId) -> Option<Quest> {
        self.state.read().await.partition.get(id).map(|e| e.quest().clone())
    }

    pub async fn get_entry(&self, id: QuestId) -> Option<QuestEntry> {
        self.state.read().await.partition.get(id).cloned()
    }

    pub async fn contains(&self, id: QuestId) -> bool {
        self.state.read().await.partition.contains(id)
    }

    pub async fn has_stub(&self, id: QuestId) -> bool {
        self.state.read().await.stubs.contains(&id)
    }

    /// Number of cached quests, optionally for one status. Hidden quests are
    /// only counted when `count_hidden` is set.
    pub async fn count(&self, status: Option<QuestStatus>) -> usize {
        let count_hidden = self.settings.current().count_hidden;
        let state = self.state.read().await;
        statuses(status)
            .iter()
            .map(|s| {
                state
                    .partition
                    .map(*s)
                    .values()
                    .filter(|e| count_hidden || !e.is_hidden())
                    .count()
            })
            .sum()
    }

    /// Entries in collection order, optionally for one status.
    pub async fn entries(&self, status: Option<QuestStatus>) -> Vec<QuestEntry> {
        let mut guard = self.state.write().await;
        let CacheState {
            partition,
            collections,
            ..
        } = &mut *guard;

        let mut out = Vec::new();
        for s in statuses(status) {
            out.extend(
                collections
                    .ids(s, partition)
                    .iter()
                    .filter_map(|id| partition.get(*id))
                    .cloned(),
            );
        }
        out
    }

    pub async fn find(
        &self,
        predicate: impl Fn(&QuestEntry) -> bool,
        status: Option<QuestStatus>,
    ) -> Option<QuestEntry> {
        let state = self.state.read().await;
        statuses(status)
            .iter()
            .flat_map(|s| state.partition.map(*s).values())
            .find(|e| predicate(e))
            .cloned()
    }

    pub async fn filter(
        &self,
        predicate: impl Fn(&QuestEntry) -> bool,
        status: Option<QuestStatus>,
    ) -> Vec<QuestEntry> {
        let state = self.state.read().await;
        statuses(status)
            .iter()
            .flat_map(|s| state.partition.map(*s).values())
            .filter(|e| predicate(e))
            .cloned()
            .collect()
    }

    /// Entries of one status, sorted by `comparator` or the status default.
    pub async fn sorted(
        &self,
        status: QuestStatus,
        comparator: Option<&Comparator>,
    ) -> Vec<QuestEntry> {
        let mut entries = self.entries(Some(status)).await;
        match comparator {
            Some(cmp) => entries.sort_by(|a, b| cmp(a, b)),
            None => entries.sort_by(default_comparator(status)),
        }
        entries
    }

    /// Every status sorted, using `comparators` where given.
    pub async fn sorted_all(
        &self,
        comparators: &HashMap<QuestStatus, Box<Comparator>>,
    ) -> BTreeMap<QuestStatus, Vec<QuestEntry>> {
        let mut out = BTreeMap::new();
        for status in QuestStatus::ALL {
            let cmp = comparators.get(&status).map(|c| c.as_ref());
            out.insert(status, self.sorted(status, cmp).await);
        }
        out
    }

    #[cfg(test)]
    pub(crate) async fn collection_builds(&self, status: QuestStatus) -> usize {
        self.state.read().await.collections.builds(status)
    }
}

fn statuses(status: Option<QuestStatus>) -> Vec<QuestStatus> {
    match status {
        Some(s) => vec![s],
        None => QuestStatus::ALL.to_vec(),
    }
}

fn log_payload_error(id: QuestId, e: &PayloadError) {
    if e.is_schema_mismatch() {
        tracing::error!(quest_id = %id, error = %e, "Quest payload does not match schema");
    } else {
        tracing::debug!(quest_id = %id, error = %e, "Skipping record without quest payload");
    }
}

fn by_name(a: &QuestEntry, b: &QuestEntry) -> Ordering {
    a.quest()
        .name()
        .to_lowercase()
        .cmp(&b.quest().name().to_lowercase())
        .then_with(|| a.id().cmp(&b.id()))
}

fn by_end_desc(a: &QuestEntry, b: &QuestEntry) -> Ordering {
    b.quest()
        .dates()
        .end
        .cmp(&a.quest().dates().end)
        .then_with(|| by_name(a, b))
}

/// Alphabetical for open statuses, most recently ended first for finished ones.
pub fn default_comparator(status: QuestStatus) -> fn(&QuestEntry, &QuestEntry) -> Ordering {
    if status.is_finished() {
        by_end_desc
    } else {
        by_name
    }
}
