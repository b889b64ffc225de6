//! Settings changes that alter who sees what.

use std::collections::HashSet;

use questlog_domain::{Caller, QuestSettings, QuestStatus};

use crate::api::ViewEvent;
use crate::stores::CacheEvent;
use crate::test_fixtures::world_seeder::{owned_quest, public_quest, seed};
use crate::test_fixtures::{eventually, next_matching, settle, TestWorld};

#[tokio::test]
async fn revoking_trusted_edit_removes_each_inactive_quest_once() {
    let world = TestWorld::new(QuestSettings {
        trusted_player_edit: true,
        ..QuestSettings::default()
    });
    let editor = world.client(Caller::trusted("Tess")).await;
    let user = editor.caller.user_id;
    let a = seed(&world.store, &owned_quest("Draft A", QuestStatus::Inactive, user)).await;
    let b = seed(&world.store, &owned_quest("Draft B", QuestStatus::Inactive, user)).await;
    let open = seed(&world.store, &owned_quest("Open C", QuestStatus::Available, user)).await;

    assert!(eventually(|| async { editor.cache.filter(|_| true, None).await.len() == 3 }).await);
    let mut events = editor.subscribe_cache();

    world.update_settings(|s| s.trusted_player_edit = false).await;
    assert!(eventually(|| async { !editor.cache.contains(a).await && !editor.cache.contains(b).await }).await);
    settle().await;

    let mut removed = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let CacheEvent::Removed(id) = event {
            removed.push(id);
        }
    }
    removed.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(removed, expected);

    // The owned available quest stays observable
    assert!(editor.cache.contains(open).await);
    assert!(editor.cache.has_stub(a).await);
}

#[tokio::test]
async fn hiding_the_log_empties_player_caches_only() {
    let world = TestWorld::new(QuestSettings::default());
    let ids: HashSet<_> = [
        seed(&world.store, &public_quest("North Road", QuestStatus::Available)).await,
        seed(&world.store, &public_quest("South Road", QuestStatus::Active)).await,
    ]
    .into_iter()
    .collect();
    let gm = world.client(Caller::gm("Dana")).await;
    let player = world.client(Caller::player("Sam")).await;
    let mut player_views = player.subscribe_views();
    assert_eq!(player.count(None).await, 2);

    world.update_settings(|s| s.hide_quest_log = true).await;

    assert!(eventually(|| async { player.cache.filter(|_| true, None).await.is_empty() }).await);
    assert_eq!(
        next_matching(&mut player_views, |e| *e == ViewEvent::RefreshAll).await,
        Some(ViewEvent::RefreshAll)
    );
    settle().await;
    assert_eq!(gm.cache.filter(|_| true, None).await.len(), ids.len());

    world.update_settings(|s| s.hide_quest_log = false).await;
    assert!(eventually(|| async { player.count(None).await == 2 }).await);
}

#[tokio::test]
async fn count_setting_applies_without_consistency_check() {
    let world = TestWorld::new(QuestSettings::default());
    seed(&world.store, &public_quest("Plain", QuestStatus::Available)).await;
    seed(&world.store, &public_quest("Draft", QuestStatus::Inactive)).await;
    let gm = world.client(Caller::gm("Dana")).await;

    assert_eq!(gm.count(None).await, 1);
    world.update_settings(|s| s.count_hidden = true).await;
    assert_eq!(gm.count(None).await, 2);
}

#[tokio::test]
async fn restarting_a_client_rebuilds_without_resubscribing() {
    let world = TestWorld::new(QuestSettings::default());
    let id = seed(&world.store, &public_quest("Well Water", QuestStatus::Available)).await;
    let player = world.client(Caller::player("Sam")).await;

    player.start().await;
    assert!(player.get_quest(id).await.is_some());

    // A single loop means a single Created event per new quest
    let mut events = player.subscribe_cache();
    let second = seed(&world.store, &public_quest("Old Mill", QuestStatus::Available)).await;
    assert!(next_matching(&mut events, |e| matches!(e, CacheEvent::Created(_))).await.is_some());
    settle().await;
    assert!(events.try_recv().is_err());
    assert!(player.get_quest(second).await.is_some());
}
