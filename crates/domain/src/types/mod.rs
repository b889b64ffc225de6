//! Shared vocabulary types.

mod quest_status;
mod session;

pub use quest_status::QuestStatus;
pub use session::{Caller, Privilege, UserRole};
