//! In-memory state storage modules.
//!
//! Stores manage runtime state that doesn't belong in the backing store:
//! - `QuestCache` - per-client observable-quest index

pub mod quest_cache;

// Re-export store types
pub use quest_cache::{CacheEvent, Deletion, EnrichedQuest, QuestCache, QuestEntry};
