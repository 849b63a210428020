//! Bounded per-item neighbor heap.
//!
//! Refinement needs two things a plain `BinaryHeap` cannot provide together:
//! the current worst neighbor in O(1) (the admission test) and cheap
//! membership-by-label (a duplicate edge would waste a capacity slot).
//! `NeighborHeap` pairs an array max-heap with a label→slot map and keeps
//! both in sync on every swap.

use std::collections::HashMap;
use std::hash::Hash;

use crate::index::Neighbor;

/// Fixed-capacity max-heap of `(label, distance)` entries, keyed by label.
///
/// The entry with the greatest distance sits at the root: it is both the
/// eviction candidate and the admission threshold. The heap knows its owner
/// label and refuses self-edges outright.
#[derive(Debug, Clone)]
pub struct NeighborHeap<L> {
    owner: L,
    capacity: usize,
    entries: Vec<(L, f32)>,
    slots: HashMap<L, usize>,
}

impl<L: Eq + Hash + Clone> NeighborHeap<L> {
    pub fn new(owner: L, capacity: usize) -> Self {
        assert!(capacity > 0, "neighbor heap capacity must be positive");
        Self {
            owner,
            capacity,
            entries: Vec::with_capacity(capacity),
            slots: HashMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, label: &L) -> bool {
        self.slots.contains_key(label)
    }

    /// Entry with the greatest distance, i.e. the current worst neighbor.
    pub fn peek_max(&self) -> Option<(&L, f32)> {
        self.entries.first().map(|(label, distance)| (label, *distance))
    }

    /// Label stored at heap slot `idx`. Slot order is arbitrary; this exists
    /// so a caller can sample uniformly over members.
    pub fn label_at(&self, idx: usize) -> &L {
        &self.entries[idx].0
    }

    /// Insert `label` at `distance` if it improves the heap.
    ///
    /// Returns `true` iff the heap changed: the label was new AND either a
    /// free slot existed or a strictly worse entry was evicted. Duplicate
    /// labels, the owner itself, and (at capacity) entries no better than
    /// the current worst are all rejected.
    pub fn try_insert(&mut self, label: L, distance: f32) -> bool {
        if label == self.owner || self.contains(&label) {
            return false;
        }
        if self.entries.len() < self.capacity {
            let idx = self.entries.len();
            self.slots.insert(label.clone(), idx);
            self.entries.push((label, distance));
            self.sift_up(idx);
            return true;
        }
        // At capacity: admit only strict improvements over the worst entry.
        if distance >= self.entries[0].1 {
            return false;
        }
        let (evicted, _) = std::mem::replace(&mut self.entries[0], (label.clone(), distance));
        self.slots.remove(&evicted);
        self.slots.insert(label, 0);
        self.sift_down(0);
        true
    }

    /// Destructively extract all entries, sorted by ascending distance.
    pub fn drain_ascending(&mut self) -> Vec<Neighbor<L>> {
        let mut out = Vec::with_capacity(self.entries.len());
        while let Some(worst) = self.pop_max() {
            out.push(worst);
        }
        out.reverse();
        out
    }

    fn pop_max(&mut self) -> Option<Neighbor<L>> {
        if self.is_empty() {
            return None;
        }
        let (label, distance) = self.entries.swap_remove(0);
        self.slots.remove(&label);
        if !self.entries.is_empty() {
            let moved = self.entries[0].0.clone();
            self.slots.insert(moved, 0);
            self.sift_down(0);
        }
        Some(Neighbor { label, distance })
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            // total_cmp for IEEE 754 total ordering (NaN-safe)
            if self.entries[idx].1.total_cmp(&self.entries[parent].1).is_gt() {
                self.swap_entries(idx, parent);
                idx = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        loop {
            let left = 2 * idx + 1;
            let right = left + 1;
            let mut largest = idx;
            if left < self.entries.len()
                && self.entries[left].1.total_cmp(&self.entries[largest].1).is_gt()
            {
                largest = left;
            }
            if right < self.entries.len()
                && self.entries[right].1.total_cmp(&self.entries[largest].1).is_gt()
            {
                largest = right;
            }
            if largest == idx {
                break;
            }
            self.swap_entries(idx, largest);
            idx = largest;
        }
    }

    fn swap_entries(&mut self, a: usize, b: usize) {
        self.entries.swap(a, b);
        self.slots.insert(self.entries[a].0.clone(), a);
        self.slots.insert(self.entries[b].0.clone(), b);
    }
}
