//! Status-partitioned entry maps.
//!
//! Five disjoint maps, one per status, plus an id -> status reverse index.
//! `insert`, `remove` and `relocate` are the only operations that change
//! membership; `get_mut` hands out entries for in-place hydration.

use std::collections::HashMap;

use questlog_domain::{QuestId, QuestStatus};

use super::entry::QuestEntry;

#[derive(Debug, Default)]
pub(super) struct Partition {
    maps: [HashMap<QuestId, QuestEntry>; 5],
    index: HashMap<QuestId, QuestStatus>,
}

impl Partition {
    pub fn get(&self, id: QuestId) -> Option<&QuestEntry> {
        let status = self.index.get(&id)?;
        self.maps[status.index()].get(&id)
    }

    pub fn get_mut(&mut self, id: QuestId) -> Option<&mut QuestEntry> {
        let status = self.index.get(&id)?;
        self.maps[status.index()].get_mut(&id)
    }

    pub fn contains(&self, id: QuestId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn status_of(&self, id: QuestId) -> Option<QuestStatus> {
        self.index.get(&id).copied()
    }

    pub fn map(&self, status: QuestStatus) -> &HashMap<QuestId, QuestEntry> {
        &self.maps[status.index()]
    }

    /// Insert into the entry's own status map, evicting any previous entry
    /// for the id from whichever map held it.
    pub fn insert(&mut self, entry: QuestEntry) -> Option<QuestEntry> {
        let id = entry.id();
        let status = entry.status();
        let previous = self.remove(id);
        self.maps[status.index()].insert(id, entry);
        self.index.insert(id, status);
        previous
    }

    pub fn remove(&mut self, id: QuestId) -> Option<QuestEntry> {
        let status = self.index.remove(&id)?;
        self.maps[status.index()].remove(&id)
    }

    /// Move an entry to the map matching its quest's status. Returns the
    /// status it left, or `None` if nothing moved.
    pub fn relocate(&mut self, id: QuestId) -> Option<QuestStatus> {
        let from = self.status_of(id)?;
        let to = self.maps[from.index()].get(&id)?.quest().status();
        if from == to {
            return None;
        }
        let mut entry = self.maps[from.index()].remove(&id)?;
        entry.set_status(to);
        self.maps[to.index()].insert(id, entry);
        self.index.insert(id, to);
        Some(from)
    }

    pub fn ids(&self) -> Vec<QuestId> {
        self.index.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn clear(&mut self) {
        for map in &mut self.maps {
            map.clear();
        }
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use questlog_domain::Quest;

    fn entry(status: QuestStatus) -> QuestEntry {
        QuestEntry::new(Quest::new(QuestId::new(), "Entry", Utc::now()).with_status(status))
    }

    fn assert_exclusive(p: &Partition) {
        for id in p.ids() {
            let holders = QuestStatus::ALL
                .iter()
                .filter(|s| p.map(**s).contains_key(&id))
                .count();
            assert_eq!(holders, 1);
            assert_eq!(p.get(id).map(|e| e.status()), p.status_of(id));
        }
    }

    #[test]
    fn insert_replaces_across_maps() {
        let mut p = Partition::default();
        let e = entry(QuestStatus::Active);
        let id = e.id();
        p.insert(e.clone());

        let mut moved = e;
        moved.replace_quest(moved.quest().clone().with_status(QuestStatus::Failed));
        moved.set_status(QuestStatus::Failed);
        assert!(p.insert(moved).is_some());

        assert!(p.map(QuestStatus::Active).is_empty());
        assert_eq!(p.status_of(id), Some(QuestStatus::Failed));
        assert_exclusive(&p);
    }

    #[test]
    fn relocate_follows_quest_status() {
        let mut p = Partition::default();
        let e = entry(QuestStatus::Available);
        let id = e.id();
        p.insert(e);
        assert_eq!(p.relocate(id), None);

        let quest = p.get(id).unwrap().quest().clone().with_status(QuestStatus::Active);
        p.get_mut(id).unwrap().replace_quest(quest);
        assert_eq!(p.relocate(id), Some(QuestStatus::Available));
        assert_eq!(p.status_of(id), Some(QuestStatus::Active));
        assert_eq!(p.get(id).unwrap().status(), QuestStatus::Active);
        assert_exclusive(&p);
    }

    #[test]
    fn remove_clears_index() {
        let mut p = Partition::default();
        let e = entry(QuestStatus::Completed);
        let id = e.id();
        p.insert(e);
        assert!(p.remove(id).is_some());
        assert!(p.remove(id).is_none());
        assert!(!p.contains(id));
        assert_eq!(p.len(), 0);
    }
}
