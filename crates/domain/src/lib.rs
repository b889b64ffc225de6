//! Quest log domain: the quest entity, its stored payload schema, and the
//! rules deciding who may observe or edit a quest.

pub mod entities;
pub mod error;
pub mod ids;
pub mod schema;
pub mod types;
pub mod value_objects;
pub mod visibility;

pub use entities::{Giver, Quest, QuestDates, Reward, RewardKind, Task};
pub use error::DomainError;
pub use ids::{QuestId, RewardId, TaskId, UserId};
pub use schema::{PayloadError, QuestPayload, SCHEMA_VERSION};
pub use types::{Caller, Privilege, QuestStatus, UserRole};
pub use value_objects::{Ownership, PermissionLevel, QuestSettings};
pub use visibility::{can_edit, is_observable, is_owner};
