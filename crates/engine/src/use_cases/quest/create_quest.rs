//! Create quest use case.
//!
//! Creates a quest record on behalf of the caller and returns the quest once
//! the local cache has processed its create notification.

use std::sync::Arc;
use std::time::Duration;

use questlog_domain::{
    can_edit, is_observable, Caller, Giver, Ownership, PermissionLevel, Quest, QuestId,
    QuestStatus,
};

use crate::entities::Quests;
use crate::infrastructure::ports::{ClockPort, SettingsPort};
use crate::stores::QuestCache;

use super::error::QuestError;

/// Caller-supplied content for a new quest.
#[derive(Debug, Clone, Default)]
pub struct NewQuest {
    pub name: String,
    pub description: String,
    pub giver: Option<Giver>,
    pub personal: bool,
}

impl NewQuest {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Create quest use case.
///
/// Orchestrates: permission check, ownership defaults, store create,
/// parent linking, waiting for the cache to catch up.
///
/// A non-GM caller must be able to see the quest they create, so creation is
/// refused while the quest log is hidden from them.
pub struct CreateQuest {
    quests: Arc<Quests>,
    cache: Arc<QuestCache>,
    settings: Arc<dyn SettingsPort>,
    clock: Arc<dyn ClockPort>,
    timeout: Duration,
}

impl CreateQuest {
    pub fn new(
        quests: Arc<Quests>,
        cache: Arc<QuestCache>,
        settings: Arc<dyn SettingsPort>,
        clock: Arc<dyn ClockPort>,
        timeout: Duration,
    ) -> Self {
        Self {
            quests,
            cache,
            settings,
            clock,
            timeout,
        }
    }

    /// Execute the create quest use case.
    ///
    /// # Returns
    /// * `Ok(Some(quest))` - Quest created and cached
    /// * `Ok(None)` - Caller may not create quests; nothing was written
    pub async fn execute(
        &self,
        caller: &Caller,
        data: NewQuest,
        parent_id: Option<QuestId>,
    ) -> Result<Option<Quest>, QuestError> {
        let settings = self.settings.current();
        let privilege = caller.privilege(settings.trusted_player_edit);

        if !(privilege.is_gm() || settings.allow_player_create) {
            tracing::debug!(user = %caller.name, "Quest creation not permitted");
            return Ok(None);
        }

        let status = if privilege.is_gm() || privilege.is_trusted_editor() {
            QuestStatus::Inactive
        } else {
            QuestStatus::Available
        };

        let mut ownership = Ownership::with_default(settings.default_permission);
        if !privilege.is_gm() {
            ownership.grant(caller.user_id, PermissionLevel::Owner);
        }

        // Unresolvable or uneditable parents are treated as no parent
        let parent = match parent_id {
            Some(pid) => self
                .quests
                .load(pid)
                .await?
                .filter(|p| can_edit(p, caller, &settings)),
            None => None,
        };

        let mut quest = Quest::new(QuestId::new(), data.name, self.clock.now())
            .with_status(status)
            .with_description(data.description)
            .with_ownership(ownership)
            .with_personal(data.personal);
        quest.set_giver(data.giver);
        quest.set_parent(parent.as_ref().map(|p| p.id()))?;

        if !is_observable(&quest, caller, &settings) {
            tracing::debug!(user = %caller.name, "Creator could not observe new quest");
            return Ok(None);
        }

        let id = self.quests.create(&quest).await?;

        if let Some(mut parent) = parent {
            if parent.add_subquest(id)? {
                self.quests.save(&parent).await?;
            }
        }

        tracing::info!(quest_id = %id, user = %caller.name, status = %status, "Quest created");

        if !self.cache.wait_for(id, self.timeout).await {
            tracing::warn!(quest_id = %id, "Timed out waiting for quest create notification");
            return Ok(self.quests.load(id).await?);
        }
        Ok(self.cache.get_quest(id).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::ports::{MockDocumentStore, MockSettingsPort, StoreRecord};
    use chrono::Utc;
    use questlog_domain::QuestSettings;

    fn settings(allow_player_create: bool) -> Arc<MockSettingsPort> {
        with_settings(QuestSettings {
            allow_player_create,
            ..QuestSettings::default()
        })
    }

    fn with_settings(settings: QuestSettings) -> Arc<MockSettingsPort> {
        let mut port = MockSettingsPort::new();
        port.expect_current().returning(move || settings.clone());
        Arc::new(port)
    }

    fn echo_create(store: &mut MockDocumentStore) {
        store.expect_create().times(1).returning(|draft| {
            Ok(StoreRecord {
                id: QuestId::new(),
                name: draft.name,
                ownership: draft.ownership,
                flag: draft.flag,
            })
        });
    }

    /// Serve the drafted quest back from `get`, as if it had been stored.
    fn quest_record(id: QuestId, quest: Quest) -> StoreRecord {
        StoreRecord {
            id,
            name: quest.name().into(),
            ownership: quest.ownership().clone(),
            flag: Some(quest.to_flag().unwrap()),
        }
    }

    fn use_case(store: MockDocumentStore, settings: Arc<MockSettingsPort>) -> CreateQuest {
        let quests = Arc::new(Quests::new(Arc::new(store)));
        let cache = Arc::new(QuestCache::new(
            Caller::player("Sam"),
            Arc::clone(&quests),
            settings.clone(),
        ));
        CreateQuest::new(
            quests,
            cache,
            settings,
            Arc::new(FixedClock(Utc::now())),
            Duration::from_millis(10),
        )
    }

    #[tokio::test]
    async fn when_player_create_disabled_writes_nothing() {
        let mut store = MockDocumentStore::new();
        store.expect_create().never();

        let create = use_case(store, settings(false));
        let result = create
            .execute(&Caller::player("Sam"), NewQuest::named("My Quest"), None)
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn trusted_editor_needs_player_create_too() {
        let mut store = MockDocumentStore::new();
        store.expect_create().never();

        let create = use_case(
            store,
            with_settings(QuestSettings {
                trusted_player_edit: true,
                allow_player_create: false,
                ..QuestSettings::default()
            }),
        );
        let result = create
            .execute(&Caller::trusted("Tess"), NewQuest::named("Find the Amulet"), None)
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn hidden_quest_log_refuses_player_create() {
        let mut store = MockDocumentStore::new();
        store.expect_create().never();

        let create = use_case(
            store,
            with_settings(QuestSettings {
                allow_player_create: true,
                hide_quest_log: true,
                ..QuestSettings::default()
            }),
        );
        let result = create
            .execute(&Caller::player("Sam"), NewQuest::named("Secret Errand"), None)
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn unknown_parent_is_ignored() {
        let missing = QuestId::new();
        let mut store = MockDocumentStore::new();
        echo_create(&mut store);
        store.expect_update().never();
        store.expect_get().returning(move |id| {
            if id == missing {
                return Ok(None);
            }
            let quest = Quest::new(id, "Orphan", Utc::now()).with_status(QuestStatus::Available);
            Ok(Some(quest_record(id, quest)))
        });

        let create = use_case(store, settings(true));
        let quest = create
            .execute(&Caller::player("Sam"), NewQuest::named("Orphan"), Some(missing))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(quest.parent(), None);
    }

    #[tokio::test]
    async fn player_quest_is_available_and_owned() {
        let caller = Caller::player("Sam");
        let user_id = caller.user_id;

        let mut store = MockDocumentStore::new();
        store
            .expect_create()
            .withf(move |draft| draft.ownership.user_level(user_id) == Some(PermissionLevel::Owner))
            .times(1)
            .returning(|draft| {
                Ok(StoreRecord {
                    id: QuestId::new(),
                    name: draft.name,
                    ownership: draft.ownership,
                    flag: draft.flag,
                })
            });
        // Nothing drives the cache here, so the wait times out and the quest
        // is read back from the store
        store.expect_get().returning(|id| {
            let quest = Quest::new(id, "My Quest", Utc::now()).with_status(QuestStatus::Available);
            Ok(Some(StoreRecord {
                id,
                name: "My Quest".into(),
                ownership: Ownership::default(),
                flag: Some(quest.to_flag().unwrap()),
            }))
        });

        let create = use_case(store, settings(true));
        let quest = create
            .execute(&caller, NewQuest::named("My Quest"), None)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(quest.status(), QuestStatus::Available);
    }
}
