//! Lazily rebuilt per-status id lists.
//!
//! A slot is marked dirty when membership of its status changes and rebuilt
//! on the next read. Hydrates mutate entries in place and never touch it.

use questlog_domain::{QuestId, QuestStatus};

use super::partition::Partition;

#[derive(Debug, Default)]
struct Slot {
    ids: Vec<QuestId>,
    dirty: bool,
    #[cfg(test)]
    builds: usize,
}

#[derive(Debug)]
pub(super) struct Collections {
    slots: [Slot; 5],
}

impl Default for Collections {
    fn default() -> Self {
        let mut collections = Self {
            slots: Default::default(),
        };
        collections.invalidate_all();
        collections
    }
}

impl Collections {
    pub fn invalidate(&mut self, status: QuestStatus) {
        self.slots[status.index()].dirty = true;
    }

    pub fn invalidate_all(&mut self) {
        for slot in &mut self.slots {
            slot.dirty = true;
        }
    }

    /// Member ids of `status`, rebuilding the slot if it is dirty.
    pub fn ids(&mut self, status: QuestStatus, partition: &Partition) -> &[QuestId] {
        let slot = &mut self.slots[status.index()];
        if slot.dirty {
            let mut ids: Vec<QuestId> = partition.map(status).keys().copied().collect();
            ids.sort();
            slot.ids = ids;
            slot.dirty = false;
            #[cfg(test)]
            {
                slot.builds += 1;
            }
        }
        &slot.ids
    }

    /// How many times the slot has been rebuilt.
    #[cfg(test)]
    pub fn builds(&self, status: QuestStatus) -> usize {
        self.slots[status.index()].builds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::quest_cache::entry::QuestEntry;
    use chrono::Utc;
    use questlog_domain::Quest;

    #[test]
    fn rebuilds_only_when_dirty() {
        let mut partition = Partition::default();
        let quest = Quest::new(QuestId::new(), "A", Utc::now()).with_status(QuestStatus::Active);
        partition.insert(QuestEntry::new(quest.clone()));

        let mut collections = Collections::default();
        assert_eq!(collections.ids(QuestStatus::Active, &partition), &[quest.id()]);
        assert_eq!(collections.ids(QuestStatus::Active, &partition), &[quest.id()]);
        assert_eq!(collections.builds(QuestStatus::Active), 1);

        collections.invalidate(QuestStatus::Active);
        collections.ids(QuestStatus::Active, &partition);
        assert_eq!(collections.builds(QuestStatus::Active), 2);
        assert_eq!(collections.builds(QuestStatus::Failed), 0);
    }
}
