//! Quest status vocabulary.
//!
//! Status drives cache partitioning: every cached quest lives in exactly one
//! status partition.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Lifecycle status of a quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestStatus {
    /// In progress
    Active,
    /// Offered to players but not yet accepted
    Available,
    Completed,
    Failed,
    /// Draft; only the GM (and owning trusted editors) can see it
    Inactive,
}

impl QuestStatus {
    /// All statuses in partition order.
    pub const ALL: [QuestStatus; 5] = [
        QuestStatus::Active,
        QuestStatus::Available,
        QuestStatus::Completed,
        QuestStatus::Failed,
        QuestStatus::Inactive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestStatus::Active => "active",
            QuestStatus::Available => "available",
            QuestStatus::Completed => "completed",
            QuestStatus::Failed => "failed",
            QuestStatus::Inactive => "inactive",
        }
    }

    /// Stable index used for array-backed per-status storage.
    pub fn index(&self) -> usize {
        match self {
            QuestStatus::Active => 0,
            QuestStatus::Available => 1,
            QuestStatus::Completed => 2,
            QuestStatus::Failed => 3,
            QuestStatus::Inactive => 4,
        }
    }

    /// Completed and failed quests are finished; their end date is set.
    pub fn is_finished(&self) -> bool {
        matches!(self, QuestStatus::Completed | QuestStatus::Failed)
    }

    /// Human readable label for the rendering layer
    pub fn label(&self) -> &'static str {
        match self {
            QuestStatus::Active => "In Progress",
            QuestStatus::Available => "Available",
            QuestStatus::Completed => "Completed",
            QuestStatus::Failed => "Failed",
            QuestStatus::Inactive => "Inactive",
        }
    }
}

impl fmt::Display for QuestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(QuestStatus::Active),
            "available" => Ok(QuestStatus::Available),
            "completed" => Ok(QuestStatus::Completed),
            "failed" => Ok(QuestStatus::Failed),
            "inactive" => Ok(QuestStatus::Inactive),
            _ => Err(DomainError::parse(format!(
                "Unknown quest status: '{}'. Valid values: active, available, completed, \
                failed, inactive",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_all_order() {
        for (i, status) in QuestStatus::ALL.iter().enumerate() {
            assert_eq!(status.index(), i);
        }
    }

    #[test]
    fn parse_and_display_agree() {
        for status in QuestStatus::ALL {
            assert_eq!(status.to_string().parse::<QuestStatus>().unwrap(), status);
        }
        assert!("ACTIVE".parse::<QuestStatus>().is_err());
        assert!("hidden".parse::<QuestStatus>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&QuestStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }
}
