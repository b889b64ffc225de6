//! Seeds quest records straight into a store, bypassing any client.

use std::sync::Arc;

use chrono::Utc;

use questlog_domain::{Ownership, PermissionLevel, Quest, QuestId, QuestStatus, UserId};

use crate::entities::Quests;
use crate::infrastructure::memory_store::InMemoryDocumentStore;
use crate::infrastructure::ports::DocumentStore;

/// Quest visible to every player at observer level.
pub fn public_quest(name: &str, status: QuestStatus) -> Quest {
    Quest::new(QuestId::new(), name, Utc::now())
        .with_status(status)
        .with_ownership(Ownership::with_default(PermissionLevel::Observer))
}

/// Quest only its owner (and GMs) can see.
pub fn owned_quest(name: &str, status: QuestStatus, owner: UserId) -> Quest {
    let mut ownership = Ownership::with_default(PermissionLevel::None);
    ownership.grant(owner, PermissionLevel::Owner);
    Quest::new(QuestId::new(), name, Utc::now())
        .with_status(status)
        .with_ownership(ownership)
}

pub async fn seed(store: &Arc<InMemoryDocumentStore>, quest: &Quest) -> QuestId {
    let store: Arc<dyn DocumentStore> = store.clone();
    Quests::new(store)
        .create(quest)
        .await
        .expect("seed quest")
}

/// Parent with two subquests, linked both ways. Returns `(parent, [subs])`.
pub async fn seed_chain(
    store: &Arc<InMemoryDocumentStore>,
    name: &str,
) -> (QuestId, [QuestId; 2]) {
    let parent_id = seed(store, &public_quest(name, QuestStatus::Active)).await;

    let mut subs = [QuestId::new(); 2];
    for (i, slot) in subs.iter_mut().enumerate() {
        let mut sub = public_quest(&format!("{name} part {}", i + 1), QuestStatus::Active);
        sub.set_parent(Some(parent_id)).expect("distinct parent");
        *slot = seed(store, &sub).await;
    }

    let quests = Quests::new(store.clone());
    let mut parent = quests
        .load(parent_id)
        .await
        .expect("load parent")
        .expect("parent exists");
    for sub in subs {
        parent.add_subquest(sub).expect("distinct subquest");
    }
    quests.save(&parent).await.expect("save parent");

    (parent_id, subs)
}
