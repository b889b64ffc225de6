//! Questlog Shared - Wire types exchanged between quest log clients
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, uuid, serde_json, and thiserror
//! 2. **No business logic** - Pure data types and serialization
//! 3. **No domain IDs** - use raw `uuid::Uuid` in payloads

pub mod sync;

pub use sync::{
    DropQuestRewardData, Envelope, QuestDeletedData, RefreshAllData, RefreshQuestData,
    SetPrimaryQuestData, SetQuestStatusData, SyncError, SyncMessage, UserCantOpenQuestData,
};
