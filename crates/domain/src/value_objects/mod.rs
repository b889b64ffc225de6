//! Value objects - immutable data without identity.

mod ownership;
mod settings;

pub use ownership::{Ownership, PermissionLevel};
pub use settings::QuestSettings;
