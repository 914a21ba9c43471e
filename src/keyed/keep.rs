use super::SlotPolicy;
use crate::prefix_sum::Slot;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Slot index only ever grows; a disabled key's slot is abandoned
/// (zeroed by the caller) rather than reclaimed. Re-enabling a
/// previously-disabled key lands back on its original slot, since the
/// key → slot map is never pruned — only the live-key set is.
///
/// Cheapest when the key set is bounded and keys are re-enabled more
/// often than new ones appear.
#[derive(Debug, Clone)]
pub struct Keep<K> {
    /// Every key ever seen, mapped to its slot. Monotonically grows.
    index: HashMap<K, Slot>,
    /// Keys currently enabled; a subset of `index`'s keys.
    live: HashSet<K>,
    next: Slot,
}

impl<K> Default for Keep<K> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            live: HashSet::new(),
            next: 0,
        }
    }
}

impl<K: Eq + Hash + Clone> SlotPolicy<K> for Keep<K> {
    fn slot_for(&mut self, key: &K) -> Slot {
        let slot = match self.index.get(key) {
            Some(&slot) => slot,
            None => {
                let slot = self.next;
                self.next += 1;
                self.index.insert(key.clone(), slot);
                slot
            }
        };
        self.live.insert(key.clone());
        slot
    }

    fn release(&mut self, key: &K) -> Option<Slot> {
        if self.live.remove(key) {
            self.index.get(key).copied()
        } else {
            None
        }
    }

    fn lookup(&self, key: &K) -> Option<Slot> {
        if self.live.contains(key) {
            self.index.get(key).copied()
        } else {
            None
        }
    }

    fn keys(&self) -> Box<dyn Iterator<Item = &K> + '_> {
        Box::new(self.live.iter())
    }

    fn len(&self) -> usize {
        self.live.len()
    }

    fn clear(&mut self) {
        self.index.clear();
        self.live.clear();
        self.next = 0;
    }
}
