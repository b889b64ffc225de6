//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - The host document store (records + change notifications)
//! - The broadcast channel shared by all clients of a world
//! - World settings
//! - Clock (for testing)

mod channel;
mod error;
mod settings;
mod store;
mod testing;

pub use channel::SyncChannel;
pub use error::{ChannelError, RepoError};
pub use settings::SettingsPort;
pub use store::{DocumentStore, RecordDraft, StoreChange, StoreRecord};
pub use testing::ClockPort;

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use channel::MockSyncChannel;
#[cfg(test)]
pub use settings::MockSettingsPort;
#[cfg(test)]
pub use store::MockDocumentStore;
#[cfg(test)]
pub use testing::MockClockPort;
