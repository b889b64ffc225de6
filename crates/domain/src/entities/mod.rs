//! Domain entities.

mod quest;

pub use quest::{Giver, Quest, QuestDates, Reward, RewardKind, Task};
