//! Questlog - local demo session.
//!
//! Connects a GM and a player to one in-memory world and walks through a
//! quest's lifecycle, logging what each client's cache sees.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use questlog_domain::{Caller, PermissionLevel, QuestSettings, QuestStatus, Reward};
use questlog_engine::api::ViewEvent;
use questlog_engine::infrastructure::{
    clock::SystemClock,
    memory_channel::{InMemorySyncChannel, InMemorySyncHub},
    memory_store::InMemoryDocumentStore,
    settings::InMemorySettings,
};
use questlog_engine::stores::CacheEvent;
use questlog_engine::use_cases::quest::NewQuest;
use questlog_engine::{App, Ports};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the binary may be run from `crates/engine`).
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "questlog_engine=debug,questlog=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = QuestSettings {
        allow_player_accept: true,
        ..QuestSettings::from_env()
    };
    tracing::info!(collection = %settings.collection_name, "Starting questlog demo");

    let store = Arc::new(InMemoryDocumentStore::new(settings.collection_name.clone()));
    let settings_port = Arc::new(InMemorySettings::new(settings));
    let hub = InMemorySyncHub::new();

    let ports = |channel: InMemorySyncChannel| Ports {
        store: store.clone(),
        channel: Arc::new(channel),
        settings: settings_port.clone(),
        clock: Arc::new(SystemClock::new()),
    };

    let gm = App::new(Caller::gm("Game Master"), ports(hub.connect()));
    let player = App::new(Caller::player("Aria"), ports(hub.connect()));
    gm.start().await;
    player.start().await;

    spawn_logger("gm", &gm);
    spawn_logger("player", &player);

    let Some(quest) = gm
        .create_quest(NewQuest::named("The Lost Lighthouse"), None)
        .await?
    else {
        anyhow::bail!("GM could not create a quest");
    };
    let id = quest.id();

    let mut edited = quest.clone();
    edited.set_description("The keeper has not lit the lamp in a week.");
    edited.set_default_permission(PermissionLevel::Observer);
    edited.add_reward(Reward::abstract_reward("Keeper's Lantern", "icons/lantern.png"));
    gm.save_quest(&edited).await?;

    gm.set_status(id, QuestStatus::Available).await?;
    settle().await;
    tracing::info!(visible = player.get_quest(id).await.is_some(), "Player view after publish");

    let dispatch = player.set_status(id, QuestStatus::Active).await?;
    tracing::info!(?dispatch, "Player accepted quest");
    settle().await;

    if let Some(entry) = player.get_entry(id).await {
        tracing::info!(
            status = %entry.status(),
            hidden = entry.is_hidden(),
            "Player sees quest"
        );
    }

    gm.set_status(id, QuestStatus::Completed).await?;
    gm.delete_quest(id).await?;
    settle().await;

    tracing::info!(
        gm_quests = gm.count(None).await,
        player_quests = player.count(None).await,
        "Demo finished"
    );

    gm.shutdown();
    player.shutdown();
    Ok(())
}

fn spawn_logger(label: &'static str, app: &App) {
    let mut cache_rx = app.subscribe_cache();
    let mut view_rx = app.subscribe_views();

    tokio::spawn(async move {
        while let Ok(event) = cache_rx.recv().await {
            match &event {
                CacheEvent::Updated {
                    previous_status: Some(from),
                    entry,
                    ..
                } => tracing::info!(client = label, quest_id = %event.quest_id(), from = %from, to = %entry.status(), "Quest moved"),
                _ => tracing::info!(client = label, quest_id = %event.quest_id(), event = event.name(), "Cache event"),
            }
        }
    });

    tokio::spawn(async move {
        while let Ok(event) = view_rx.recv().await {
            if let ViewEvent::Notice { level, message } = event {
                tracing::info!(client = label, ?level, %message, "Notice");
            }
        }
    });
}

/// Give the notification loops a moment to drain.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
