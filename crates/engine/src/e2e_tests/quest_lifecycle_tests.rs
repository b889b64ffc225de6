//! Create, edit, move and delete quests across clients.

use questlog_domain::{Caller, PermissionLevel, QuestSettings, QuestStatus};

use crate::api::ViewEvent;
use crate::infrastructure::ports::DocumentStore;
use crate::stores::CacheEvent;
use crate::test_fixtures::world_seeder::{public_quest, seed, seed_chain};
use crate::test_fixtures::{eventually, next_matching, TestWorld};
use crate::use_cases::quest::NewQuest;

#[tokio::test]
async fn gm_created_quest_starts_inactive_and_is_cached() {
    let world = TestWorld::new(QuestSettings::default());
    let gm = world.client(Caller::gm("Dana")).await;
    let player = world.client(Caller::player("Sam")).await;

    let quest = gm
        .create_quest(NewQuest::named("Rats in the Cellar"), None)
        .await
        .unwrap()
        .expect("GM may create");

    assert_eq!(quest.status(), QuestStatus::Inactive);
    assert!(gm.get_quest(quest.id()).await.is_some());

    // Inactive quests never reach players
    let id = quest.id();
    assert!(eventually(|| async { player.cache.has_stub(id).await }).await);
    assert!(player.get_quest(id).await.is_none());
}

#[tokio::test]
async fn player_create_needs_setting() {
    let world = TestWorld::new(QuestSettings::default());
    let player = world.client(Caller::player("Sam")).await;

    let refused = player
        .create_quest(NewQuest::named("My Own Quest"), None)
        .await
        .unwrap();
    assert!(refused.is_none());
    assert!(world.store.is_empty().await);

    world.update_settings(|s| s.allow_player_create = true).await;
    let quest = player
        .create_quest(NewQuest::named("My Own Quest"), None)
        .await
        .unwrap()
        .expect("player may create");

    assert_eq!(quest.status(), QuestStatus::Available);
    assert_eq!(
        quest.ownership().user_level(player.caller.user_id),
        Some(PermissionLevel::Owner)
    );
    let entry = player.get_entry(quest.id()).await.unwrap();
    assert!(entry.is_owner());
}

#[tokio::test]
async fn subquest_create_links_parent() {
    let world = TestWorld::new(QuestSettings::default());
    let gm = world.client(Caller::gm("Dana")).await;

    let parent = gm
        .create_quest(NewQuest::named("The Long Road"), None)
        .await
        .unwrap()
        .unwrap();
    let child = gm
        .create_quest(NewQuest::named("First Mile"), Some(parent.id()))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(child.parent(), Some(parent.id()));
    let parent_id = parent.id();
    let child_id = child.id();
    assert!(
        eventually(|| async {
            gm.get_quest(parent_id)
                .await
                .is_some_and(|p| p.subquests().contains(&child_id))
        })
        .await
    );
}

#[tokio::test]
async fn concurrent_status_requests_converge() {
    let world = TestWorld::new(QuestSettings::default());
    let id = seed(&world.store, &public_quest("Bridge Troll", QuestStatus::Active)).await;
    let gm_a = world.client(Caller::gm("Dana")).await;
    let gm_b = world.client(Caller::gm("Eli")).await;

    let (a, b) = tokio::join!(
        gm_a.set_status(id, QuestStatus::Completed),
        gm_b.set_status(id, QuestStatus::Completed),
    );
    a.unwrap();
    b.unwrap();

    for gm in [&gm_a, &gm_b] {
        assert!(
            eventually(|| async {
                gm.get_entry(id)
                    .await
                    .is_some_and(|e| e.status() == QuestStatus::Completed)
            })
            .await
        );
    }
    let entry = gm_a.get_entry(id).await.unwrap();
    assert!(entry.quest().dates().end.is_some());
    assert_eq!(gm_a.count(Some(QuestStatus::Active)).await, 0);
}

#[tokio::test]
async fn delete_relinks_subquests_and_closes_views() {
    let world = TestWorld::new(QuestSettings::default());
    let (parent, subs) = seed_chain(&world.store, "Harbor Trouble").await;
    let gm = world.client(Caller::gm("Dana")).await;
    let player = world.client(Caller::player("Sam")).await;
    let mut player_views = player.subscribe_views();
    let mut player_cache = player.subscribe_cache();

    let outcome = gm.delete_quest(parent).await.unwrap().expect("deleted");
    assert_eq!(outcome.deleted, parent);

    assert!(world.store.get(parent).await.unwrap().is_none());
    for sub in subs {
        assert!(
            eventually(|| async {
                player
                    .get_quest(sub)
                    .await
                    .is_some_and(|q| q.parent().is_none())
            })
            .await
        );
    }

    let closed = next_matching(&mut player_views, |e| matches!(e, ViewEvent::Close(_))).await;
    assert_eq!(closed, Some(ViewEvent::Close(parent)));
    let deleted = next_matching(&mut player_cache, |e| matches!(e, CacheEvent::Deleted(_))).await;
    assert_eq!(deleted.map(|e| e.quest_id()), Some(parent));
}

#[tokio::test]
async fn edits_reach_other_clients() {
    let world = TestWorld::new(QuestSettings::default());
    let id = seed(&world.store, &public_quest("Missing Cat", QuestStatus::Available)).await;
    let gm = world.client(Caller::gm("Dana")).await;
    let player = world.client(Caller::player("Sam")).await;

    let mut quest = gm.get_quest(id).await.unwrap();
    quest.set_description("Last seen near the bakery.");
    quest.set_gm_notes("The baker took it.");
    gm.save_quest(&quest).await.unwrap();

    assert!(
        eventually(|| async {
            player
                .get_entry(id)
                .await
                .and_then(|e| e.enrich().map(|v| v.description.clone()))
                .as_deref()
                == Some("Last seen near the bakery.")
        })
        .await
    );
    let view = player.get_entry(id).await.unwrap();
    assert_eq!(view.enrich().unwrap().gm_notes, None);
    let gm_view = gm.get_entry(id).await.unwrap();
    assert_eq!(
        gm_view.enrich().unwrap().gm_notes.as_deref(),
        Some("The baker took it.")
    );
}

#[tokio::test]
async fn player_cannot_save_quests_they_do_not_own() {
    let world = TestWorld::new(QuestSettings::default());
    let id = seed(&world.store, &public_quest("Town Watch", QuestStatus::Available)).await;
    let player = world.client(Caller::player("Sam")).await;

    let mut quest = player.get_quest(id).await.unwrap();
    quest.set_name("Renamed").unwrap();

    assert!(player.save_quest(&quest).await.is_err());
    let stored = world.store.get(id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Town Watch");
}
