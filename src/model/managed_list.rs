//! The durable ordered list of managed windows.
//!
//! Order is meaning: index 0 is the master slot, everything after it the
//! stack, top to bottom. Windows missing from a snapshot are kept in place
//! as zombies until they have been gone for the TTL, so an Electron
//! renderer flickering out of the accessibility tree for a moment does not
//! lose its slot.

use std::time::{Duration, Instant};

use crate::common::collections::HashMap;
use crate::model::window::{WindowId, WindowRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Window ids that were not in the list before this update.
    pub new_windows: usize,
    /// Records evicted because their zombie TTL elapsed.
    pub evicted: usize,
}

#[derive(Default)]
pub struct ManagedList {
    records: Vec<WindowRecord>,
    /// windowId → first scan that missed it.
    zombies: HashMap<WindowId, Instant>,
}

impl ManagedList {
    pub fn new() -> Self { ManagedList::default() }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    pub fn records(&self) -> &[WindowRecord] { &self.records }

    pub fn index_of(&self, id: WindowId) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    pub fn get(&self, id: WindowId) -> Option<&WindowRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn is_zombie(&self, id: WindowId) -> bool { self.zombies.contains_key(&id) }

    /// Records that participate in layout: present, on screen, not zombies.
    pub fn tileable(&self) -> impl Iterator<Item = &WindowRecord> {
        self.records.iter().filter(|r| r.on_screen && !self.zombies.contains_key(&r.id))
    }

    /// Merge a discovery snapshot, preserving the order of surviving
    /// records and appending unseen ids in snapshot order.
    pub fn reconcile(
        &mut self,
        snapshot: Vec<WindowRecord>,
        now: Instant,
        ttl: Duration,
    ) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();
        let mut incoming: HashMap<WindowId, WindowRecord> =
            snapshot.iter().map(|r| (r.id, r.clone())).collect();

        let mut next = Vec::with_capacity(self.records.len() + snapshot.len());
        for old in self.records.drain(..) {
            if let Some(fresh) = incoming.remove(&old.id) {
                self.zombies.remove(&old.id);
                next.push(fresh);
            } else {
                let first_missed = *self.zombies.entry(old.id).or_insert(now);
                if now.duration_since(first_missed) < ttl {
                    next.push(old);
                } else {
                    self.zombies.remove(&old.id);
                    summary.evicted += 1;
                }
            }
        }

        for fresh in snapshot {
            if incoming.remove(&fresh.id).is_some() {
                summary.new_windows += 1;
                next.push(fresh);
            }
        }

        self.records = next;
        summary
    }

    /// Move `id` to the master slot. Returns false when absent or already
    /// master.
    pub fn promote(&mut self, id: WindowId) -> bool {
        match self.index_of(id) {
            Some(0) | None => false,
            Some(index) => {
                let record = self.records.remove(index);
                self.records.insert(0, record);
                true
            }
        }
    }

    /// Move `id` to `index` (clamped). Returns false on a no-op.
    pub fn move_to_index(&mut self, id: WindowId, index: usize) -> bool {
        let Some(from) = self.index_of(id) else {
            return false;
        };
        let to = index.min(self.records.len() - 1);
        if from == to {
            return false;
        }
        let record = self.records.remove(from);
        self.records.insert(to, record);
        true
    }

    /// Swap `id` with its neighbor `offset` away, clamped to the ends.
    /// Returns false when the clamped position equals the current one.
    pub fn swap_neighbor(&mut self, id: WindowId, offset: isize) -> bool {
        let Some(from) = self.index_of(id) else {
            return false;
        };
        let to = from
            .saturating_add_signed(offset)
            .min(self.records.len() - 1);
        if from == to {
            return false;
        }
        self.records.swap(from, to);
        true
    }

    /// Drop a record immediately, regardless of zombie state.
    pub fn evict(&mut self, id: WindowId) -> bool {
        self.zombies.remove(&id);
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        self.records.len() != before
    }
}
