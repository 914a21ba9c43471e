use super::{EnablingEntry, GsmpSampler};
use crate::distribution::Distribution;
use crate::error::{GsmpError, GsmpResult};
use crate::rng::RngCore;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Stateless-between-calls sampler: `next` redraws every
/// enabled clock and takes the minimum. O(n) memory, O(n) draws per
/// call — the reference/oracle implementation, correct for any
/// distribution with no per-clock state to keep consistent.
#[derive(Debug, Clone, Default)]
pub struct FirstReaction<K: Eq + Hash + Clone + Debug> {
    entries: HashMap<K, EnablingEntry>,
}

impl<K: Eq + Hash + Clone + Debug> FirstReaction<K> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K: Eq + Hash + Clone + Debug> GsmpSampler<K> for FirstReaction<K> {
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
        self.entries
            .insert(key, EnablingEntry::new(distribution, te, when));
        Ok(())
    }

    fn disable(&mut self, key: &K, _when: f64) -> GsmpResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn fire(&mut self, key: &K, _when: f64) -> GsmpResult<()> {
        if self.entries.remove(key).is_none() {
            return Err(GsmpError::precondition(format!(
                "fire of unknown key {key:?}"
            )));
        }
        Ok(())
    }

    fn next(&mut self, now: f64, rng: &mut dyn RngCore) -> Option<(f64, K)> {
        self.entries
            .iter()
            .filter_map(|(key, entry)| {
                let shift = (now - entry.te).max(0.0);
                let elapsed = entry.distribution.sample_shifted(shift, rng);
                let tau = entry.te + elapsed;
                tau.is_finite().then_some((tau, key.clone()))
            })
            .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap())
    }

    fn reset(&mut self) {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::{Exponential, Never};
    use crate::rng::SmallRngHandle;

    #[test]
    fn picks_the_minimum_draw() {
        let mut sampler = FirstReaction::new();
        let mut rng = SmallRngHandle::seeded(5);
        for (k, rate) in [("slow", 0.1), ("fast", 50.0)] {
            sampler
                .enable(k, Box::new(Exponential::new(rate)), 0.0, 0.0, &mut rng)
                .unwrap();
        }
        // the high-rate clock should win far more often than not over many redraws
        let mut fast_wins = 0;
        for _ in 0..200 {
            if let Some((_, key)) = sampler.next(0.0, &mut rng) {
                if key == "fast" {
                    fast_wins += 1;
                }
            }
        }
        assert!(fast_wins > 150, "fast won {fast_wins}/200");
    }

    #[test]
    fn never_clock_never_wins() {
        let mut sampler = FirstReaction::new();
        let mut rng = SmallRngHandle::seeded(2);
        sampler
            .enable("never", Box::new(Never), 0.0, 0.0, &mut rng)
            .unwrap();
        sampler
            .enable("exp", Box::new(Exponential::new(1.0)), 0.0, 0.0, &mut rng)
            .unwrap();
        for _ in 0..50 {
            let (_, key) = sampler.next(0.0, &mut rng).unwrap();
            assert_eq!(key, "exp");
        }
    }

    #[test]
    fn next_is_idempotent_between_state_changes_l2() {
        // FirstReaction redraws every call, so "idempotent" here means
        // "the enabled set and shift don't change" rather than "returns
        // the same tau" -- verified instead via the invariant that the
        // returned key is always drawn from the still-enabled set.
        let mut sampler = FirstReaction::new();
        let mut rng = SmallRngHandle::seeded(1);
        sampler
            .enable("a", Box::new(Exponential::new(1.0)), 0.0, 0.0, &mut rng)
            .unwrap();
        for _ in 0..10 {
            let (_, key) = sampler.next(0.0, &mut rng).unwrap();
            assert_eq!(key, "a");
        }
    }
}
