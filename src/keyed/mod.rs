//! Lifts [`crate::prefix_sum::PrefixSum`] to arbitrary clock keys. The
//! prefix-sum backings only know about contiguous `Slot` indices;
//! [`KeyedPrefixSum`] owns the key ↔ slot mapping on top of one.

mod keep;
mod remove;

pub use keep::Keep;
pub use remove::Remove;

use crate::prefix_sum::{PrefixSum, Slot};
use std::hash::Hash;

/// How a disabled key's slot is reclaimed.
///
/// [`Keep`] never frees a slot: the key→slot map only grows, and a
/// disabled slot's weight is zeroed in place. [`Remove`] pushes vacated
/// slots onto a free list and reuses them on the next insertion, keeping
/// the backing prefix-sum's length bounded by the live key count.
pub trait SlotPolicy<K: Eq + Hash + Clone> {
    /// Returns the slot for `key`, allocating one (possibly recycled) if
    /// absent.
    fn slot_for(&mut self, key: &K) -> Slot;
    /// Removes the key→slot association, returning its slot if the key
    /// was present.
    fn release(&mut self, key: &K) -> Option<Slot>;
    /// Looks up the slot for an already-enabled key.
    fn lookup(&self, key: &K) -> Option<Slot>;
    /// Keys currently mapped to a slot, in no particular order.
    fn keys(&self) -> Box<dyn Iterator<Item = &K> + '_>;
    fn len(&self) -> usize;
    fn clear(&mut self);
}

/// A [`PrefixSum`] indexed by arbitrary keys rather than raw slots.
///
/// `P` is the prefix-sum backing ([`crate::prefix_sum::BinaryTreePrefixSum`]
/// or [`crate::prefix_sum::CumulativeSumPrefixSum`]); `S` is the slot
/// policy ([`Keep`] or [`Remove`]).
#[derive(Debug, Clone, Default)]
pub struct KeyedPrefixSum<K, P, S> {
    sums: P,
    slots: S,
    _key: std::marker::PhantomData<K>,
}

impl<K, P, S> KeyedPrefixSum<K, P, S>
where
    K: Eq + Hash + Clone,
    P: PrefixSum,
    S: SlotPolicy<K> + Default,
{
    pub fn new() -> Self {
        Self {
            sums: P::default(),
            slots: S::default(),
            _key: std::marker::PhantomData,
        }
    }

    /// Sets the weight for `key`, enabling it if it was absent.
    pub fn set(&mut self, key: &K, w: f64) {
        match self.slots.lookup(key) {
            Some(slot) => self.sums.set(slot, w),
            None => {
                let slot = self.slots.slot_for(key);
                if slot == self.sums.len() {
                    self.sums.push(w);
                } else {
                    self.sums.set(slot, w);
                }
            }
        }
    }

    /// Reads the current weight for `key`, or `0.0` if disabled/absent.
    pub fn get(&self, key: &K) -> f64 {
        self.slots
            .lookup(key)
            .map(|slot| self.sums.get(slot))
            .unwrap_or(0.0)
    }

    /// Disables `key`: zeroes its weight and releases its slot per the
    /// policy. No-op if the key was not enabled.
    pub fn delete(&mut self, key: &K) {
        if let Some(slot) = self.slots.release(key) {
            self.sums.set(slot, 0.0);
        }
    }

    pub fn total(&mut self) -> f64 {
        self.sums.total()
    }

    /// Selects the key whose bucket contains cumulative value `v`.
    ///
    /// Precondition: `0 <= v < total()`.
    pub fn choose(&mut self, v: f64) -> (K, f64) {
        let (slot, residual) = self.sums.find(v);
        let key = self
            .slots
            .keys()
            .find(|k| self.slots.lookup(k) == Some(slot))
            .cloned()
            .expect("find() returned a slot with no owning key");
        (key, residual)
    }

    /// Currently-enabled keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.slots.keys()
    }

    pub fn length(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    pub fn clear(&mut self) {
        self.sums.clear();
        self.slots.clear();
    }
}
