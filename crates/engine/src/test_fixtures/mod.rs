//! Shared test helpers.
//!
//! A [`TestWorld`] is one store, one sync hub and one settings source shared
//! by any number of clients, each built with [`TestWorld::client`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_fixtures::TestWorld;
//!
//! #[tokio::test]
//! async fn gm_and_player() {
//!     let world = TestWorld::new(QuestSettings::default());
//!     let gm = world.client(Caller::gm("Dana")).await;
//!     // ... test logic
//! }
//! ```

pub mod world_seeder;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use questlog_domain::{Caller, QuestSettings};

use crate::app::{App, Ports};
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::memory_channel::InMemorySyncHub;
use crate::infrastructure::memory_store::InMemoryDocumentStore;
use crate::infrastructure::ports::SettingsPort;
use crate::infrastructure::settings::InMemorySettings;

/// Default wait for asynchronous propagation between clients.
pub const PROPAGATION_TIMEOUT: Duration = Duration::from_secs(2);

pub struct TestWorld {
    pub store: Arc<InMemoryDocumentStore>,
    pub hub: Arc<InMemorySyncHub>,
    pub settings: Arc<InMemorySettings>,
}

impl TestWorld {
    pub fn new(settings: QuestSettings) -> Self {
        Self {
            store: Arc::new(InMemoryDocumentStore::new(settings.collection_name.clone())),
            hub: InMemorySyncHub::new(),
            settings: Arc::new(InMemorySettings::new(settings)),
        }
    }

    /// A started client connected to this world.
    pub async fn client(&self, caller: Caller) -> App {
        let app = App::new(
            caller,
            Ports {
                store: self.store.clone(),
                channel: Arc::new(self.hub.connect()),
                settings: self.settings.clone(),
                clock: Arc::new(SystemClock::new()),
            },
        );
        app.start().await;
        app
    }

    pub async fn update_settings(&self, change: impl FnOnce(&mut QuestSettings)) {
        let mut next = self.settings.current();
        change(&mut next);
        self.settings
            .update(next)
            .await
            .expect("in-memory settings update");
    }
}

/// Poll `check` until it returns true or [`PROPAGATION_TIMEOUT`] elapses.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + PROPAGATION_TIMEOUT;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Next event matching `pred`, skipping others. `None` on timeout.
pub async fn next_matching<T: Clone>(
    rx: &mut broadcast::Receiver<T>,
    pred: impl Fn(&T) -> bool,
) -> Option<T> {
    tokio::time::timeout(PROPAGATION_TIMEOUT, async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return Some(event),
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
    .await
    .ok()
    .flatten()
}

/// Let background loops drain without waiting on a condition.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}
