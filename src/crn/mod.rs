//! Common Random Numbers variance reduction: a decorator over any
//! [`GsmpSampler`] that pins RNG state per `(key, epoch)` so
//! perturbed-parameter runs draw the same underlying uniforms.
//!
//! Requires an inner sampler whose randomness per clock is entirely
//! consumed at `enable` time ([`crate::CombinedNextReaction`],
//! [`crate::FirstToFire`], [`crate::FirstReaction`]) — [`crate::DirectCall`]
//! draws its randomness jointly at `next` over the whole ensemble, so
//! wrapping it here would not pin anything meaningful.
//!
//! This is not an impl of [`GsmpSampler`] itself: capture/restore needs
//! the concrete RNG's associated `State`, which [`crate::rng::RngCore`]
//! (the object-safe half used by the trait's `&mut dyn RngCore`
//! parameter) does not expose. Its method surface mirrors
//! [`GsmpSampler`]'s shape instead, taking `&mut R` directly.

use crate::distribution::Distribution;
use crate::error::GsmpResult;
use crate::rng::GsmpRng;
use crate::samplers::GsmpSampler;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Wraps `inner: S` with an RNG-state cache keyed by `(key, epoch)`,
/// where `epoch` counts how many times `key` has been enabled so far in
/// the current run. A `Never`-distributed clock still draws and caches
/// a snapshot here — it is a legal clock, not a "no event" condition, so
/// it still occupies an epoch slot.
pub struct CommonRandomRecorder<K: Eq + Hash + Clone + Debug, S, R: GsmpRng> {
    inner: S,
    snapshots: HashMap<(K, u64), R::State>,
    epochs: HashMap<K, u64>,
    misses: Vec<(K, u64)>,
    frozen: bool,
    run: u64,
}

// Written by hand rather than derived: `R::State` is an associated type,
// and `#[derive(Clone)]`/`#[derive(Debug)]` would bound `R` itself
// instead, which neither implies nor is implied by `R::State: Clone`.
impl<K, S, R> Clone for CommonRandomRecorder<K, S, R>
where
    K: Eq + Hash + Clone + Debug,
    S: Clone,
    R: GsmpRng,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            snapshots: self.snapshots.clone(),
            epochs: self.epochs.clone(),
            misses: self.misses.clone(),
            frozen: self.frozen,
            run: self.run,
        }
    }
}

impl<K, S, R> Debug for CommonRandomRecorder<K, S, R>
where
    K: Eq + Hash + Clone + Debug,
    S: Debug,
    R: GsmpRng,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommonRandomRecorder")
            .field("inner", &self.inner)
            .field("epochs", &self.epochs)
            .field("misses", &self.misses)
            .field("frozen", &self.frozen)
            .field("run", &self.run)
            .field("snapshot_count", &self.snapshots.len())
            .finish()
    }
}

impl<K, S, R> CommonRandomRecorder<K, S, R>
where
    K: Eq + Hash + Clone + Debug,
    S: GsmpSampler<K>,
    R: GsmpRng,
{
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            snapshots: HashMap::new(),
            epochs: HashMap::new(),
            misses: Vec::new(),
            frozen: false,
            run: 0,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn enable(
        &mut self,
        key: K,
        distribution: Box<dyn Distribution>,
        te: f64,
        when: f64,
        rng: &mut R,
    ) -> GsmpResult<()> {
        let epoch = *self.epochs.get(&key).unwrap_or(&0);
        let slot = (key.clone(), epoch);
        match self.snapshots.get(&slot) {
            Some(state) => {
                #[cfg(feature = "trace")]
                log::trace!("crn: replaying snapshot for {:?} epoch {}", slot.0, slot.1);
                rng.restore(state)
            }
            None => {
                #[cfg(feature = "trace")]
                log::debug!("crn: miss for {:?} epoch {} (frozen={})", slot.0, slot.1, self.frozen);
                self.misses.push(slot.clone());
                if !self.frozen {
                    self.snapshots.insert(slot, rng.capture());
                }
            }
        }
        self.epochs.insert(key.clone(), epoch + 1);
        self.inner.enable(key, distribution, te, when, rng)
    }

    pub fn disable(&mut self, key: &K, when: f64) -> GsmpResult<()> {
        self.inner.disable(key, when)
    }

    pub fn fire(&mut self, key: &K, when: f64) -> GsmpResult<()> {
        self.inner.fire(key, when)
    }

    pub fn next(&mut self, now: f64, rng: &mut R) -> Option<(f64, K)> {
        self.inner.next(now, rng)
    }

    /// Clears clock state and per-key epoch counters, but retains the
    /// snapshot store — a later run re-enabling the same keys in the
    /// same order replays the same RNG states.
    pub fn reset(&mut self) {
        self.run += 1;
        self.epochs.clear();
        self.inner.reset();
    }

    /// After `freeze`, no new snapshots are recorded; existing ones
    /// continue to be replayed. Safe to share the recorder across
    /// parallel runs once frozen.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn run(&self) -> u64 {
        self.run
    }

    /// Enables that required a fresh snapshot (no hit), across the
    /// recorder's whole lifetime — a diagnostic for CRN effectiveness.
    pub fn miss_count(&self) -> usize {
        self.misses.len()
    }

    pub fn misses(&self) -> impl Iterator<Item = &(K, u64)> {
        self.misses.iter()
    }

    pub fn length(&self) -> usize {
        self.inner.length()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn keys(&self) -> Vec<K> {
        self.inner.keys()
    }

    pub fn isenabled(&self, key: &K) -> bool {
        self.inner.isenabled(key)
    }

    pub fn copy_clocks(&mut self, src: &Self)
    where
        S: Clone,
    {
        self.inner = src.inner.clone();
    }
}
