use super::{EnablingEntry, GsmpSampler};
use crate::distribution::Distribution;
use crate::error::{GsmpError, GsmpResult};
use crate::keyed::{KeyedPrefixSum, SlotPolicy};
use crate::prefix_sum::PrefixSum;
use crate::rng::RngCore;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Exponential-only Direct Method: draws the joint `(when, which)` from
/// the sum of hazards and a proportional selector, rather than per-clock
/// putative times.
///
/// `P` selects the prefix-sum backing, `S` the key slot policy — two
/// independently pluggable axes.
#[derive(Debug, Clone, Default)]
pub struct DirectCall<K, P, S> {
    rates: KeyedPrefixSum<K, P, S>,
    entries: HashMap<K, EnablingEntry>,
}

impl<K, P, S> DirectCall<K, P, S>
where
    K: Eq + Hash + Clone + Debug,
    P: PrefixSum,
    S: SlotPolicy<K> + Default,
{
    pub fn new() -> Self {
        Self {
            rates: KeyedPrefixSum::new(),
            entries: HashMap::new(),
        }
    }
}

impl<K, P, S> GsmpSampler<K> for DirectCall<K, P, S>
where
    K: Eq + Hash + Clone + Debug,
    P: PrefixSum,
    S: SlotPolicy<K> + Default,
{
    fn enable(
        &mut self,
        key: K,
        distribution: Box<dyn Distribution>,
        te: f64,
        when: f64,
        _rng: &mut dyn RngCore,
    ) -> GsmpResult<()> {
        if self.entries.contains_key(&key) {
            return Err(GsmpError::precondition(format!(
                "enable of already-enabled key {key:?}"
            )));
        }
        let rate = distribution.rate().ok_or_else(|| {
            GsmpError::precondition(format!(
                "DirectCall requires a constant-rate distribution, got {distribution:?} for key {key:?}"
            ))
        })?;
        self.rates.set(&key, rate);
        self.entries
            .insert(key, EnablingEntry::new(distribution, te, when));
        Ok(())
    }

    fn disable(&mut self, key: &K, _when: f64) -> GsmpResult<()> {
        if self.entries.remove(key).is_some() {
            self.rates.delete(key);
        }
        Ok(())
    }

    fn fire(&mut self, key: &K, _when: f64) -> GsmpResult<()> {
        if self.entries.remove(key).is_none() {
            return Err(GsmpError::precondition(format!(
                "fire of unknown key {key:?}"
            )));
        }
        self.rates.delete(key);
        Ok(())
    }

    fn next(&mut self, now: f64, rng: &mut dyn RngCore) -> Option<(f64, K)> {
        let total = self.rates.total();
        if total <= 0.0 {
            return None;
        }
        let dt = rng.exponential1() / total;
        let u = rng.uniform01() * total;
        let (key, _residual) = self.rates.choose(u);
        Some((now + dt, key))
    }

    fn reset(&mut self) {
        self.rates.clear();
        self.entries.clear();
    }

    fn length(&self) -> usize {
        self.entries.len()
    }

    fn keys(&self) -> Vec<K> {
        self.entries.keys().cloned().collect()
    }

    fn isenabled(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }
}

impl<K, P, S> DirectCall<K, P, S>
where
    K: Eq + Hash + Clone + Debug,
    P: PrefixSum,
    S: SlotPolicy<K> + Default,
{
    /// Current sum of enabled rates, for [`super::MultiSampler`]'s
    /// "multiple-direct" specialization to mirror into its own top-level
    /// prefix-sum without duplicating rate bookkeeping.
    pub fn total_rate(&mut self) -> f64 {
        self.rates.total()
    }

    /// Selects a key given an already-drawn cumulative value `v` in
    /// `[0, total_rate())`, without drawing a new inter-event time.
    /// Used when a hierarchical Direct sampler has already chosen this
    /// child and only needs the within-child key.
    pub fn select(&mut self, v: f64) -> (K, f64) {
        self.rates.choose(v)
    }
}
