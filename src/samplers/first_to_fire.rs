use super::heap::IndexedMinHeap;
use super::{EnablingEntry, GsmpSampler};
use crate::distribution::Distribution;
use crate::error::{GsmpError, GsmpResult};
use crate::rng::RngCore;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Indexed priority queue by firing time: every enable draws a firing
/// time once; `next` is just a heap peek.
#[derive(Debug, Clone, Default)]
pub struct FirstToFire<K: Eq + Hash + Clone + Debug> {
    entries: HashMap<K, EnablingEntry>,
    heap: IndexedMinHeap<K>,
    seq: u64,
}

impl<K: Eq + Hash + Clone + Debug> FirstToFire<K> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K: Eq + Hash + Clone + Debug> GsmpSampler<K> for FirstToFire<K> {
    fn enable(
        &mut self,
        key: K,
        distribution: Box<dyn Distribution>,
        te: f64,
        when: f64,
        rng: &mut dyn RngCore,
    ) -> GsmpResult<()> {
        if self.entries.contains_key(&key) {
            return Err(GsmpError::precondition(format!(
                "enable of already-enabled key {key:?}"
            )));
        }
        let shift = (when - te).max(0.0);
        let elapsed = distribution.sample_shifted(shift, rng);
        let tau = te + elapsed;
        #[cfg(feature = "trace")]
        log::trace!("first-to-fire: enable {key:?} at when={when} -> tau={tau}");
        if tau.is_finite() {
            self.seq += 1;
            self.heap.push(tau, self.seq, key.clone());
        }
        self.entries
            .insert(key, EnablingEntry::new(distribution, te, when));
        Ok(())
    }

    fn disable(&mut self, key: &K, _when: f64) -> GsmpResult<()> {
        if self.entries.remove(key).is_some() {
            self.heap.remove(key);
            #[cfg(feature = "trace")]
            log::trace!("first-to-fire: disable {key:?}");
        }
        Ok(())
    }

    fn fire(&mut self, key: &K, _when: f64) -> GsmpResult<()> {
        if self.entries.remove(key).is_none() {
            return Err(GsmpError::precondition(format!(
                "fire of unknown key {key:?}"
            )));
        }
        self.heap.remove(key);
        #[cfg(feature = "trace")]
        log::trace!("first-to-fire: fire {key:?}");
        Ok(())
    }

    fn next(&mut self, _now: f64, _rng: &mut dyn RngCore) -> Option<(f64, K)> {
        self.heap.peek_min().map(|(t, _, k)| (*t, k.clone()))
    }

    fn reset(&mut self) {
        self.entries.clear();
        self.heap.clear();
        self.seq = 0;
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
    fn single_clock_with_known_draw_matches_hand_computed_firing_time() {
        // rate 2.0, Uniform draw = 0.5 -> tau = 0.346574...
        struct FixedHalf;
        impl RngCore for FixedHalf {
            fn uniform01(&mut self) -> f64 {
                0.5
            }
            fn exponential1(&mut self) -> f64 {
                -0.5_f64.ln()
            }
        }
        let mut sampler = FirstToFire::new();
        let mut rng = FixedHalf;
        sampler
            .enable("clock", Box::new(Exponential::new(2.0)), 0.0, 0.0, &mut rng)
            .unwrap();
        let (tau, key) = sampler.next(0.0, &mut rng).unwrap();
        assert_eq!(key, "clock");
        assert!((tau - 0.346_574).abs() < 1e-5);
    }

    #[test]
    fn min_among_several_clocks_p2() {
        let mut sampler = FirstToFire::new();
        let mut rng = SmallRngHandle::seeded(3);
        for (k, rate) in [("a", 1.0), ("b", 5.0), ("c", 0.5)] {
            sampler
                .enable(k, Box::new(Exponential::new(rate)), 0.0, 0.0, &mut rng)
                .unwrap();
        }
        let (tau, key) = sampler.next(0.0, &mut rng).unwrap();
        let mut all: Vec<_> = sampler
            .heap
            .nodes()
            .iter()
            .map(|(t, _, k)| (*t, k.clone()))
            .collect();
        all.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        assert_eq!((tau, key), all[0]);
    }

    #[test]
    fn never_clock_is_invisible_to_next_b2() {
        let mut sampler = FirstToFire::new();
        let mut rng = SmallRngHandle::seeded(9);
        sampler
            .enable("never", Box::new(Never), 0.0, 0.0, &mut rng)
            .unwrap();
        assert!(sampler.isenabled(&"never"));
        assert!(sampler.next(0.0, &mut rng).is_none());
    }

    #[test]
    fn fire_of_unknown_key_is_precondition_violation() {
        let mut sampler: FirstToFire<&str> = FirstToFire::new();
        let err = sampler.fire(&"ghost", 0.0).unwrap_err();
        assert!(matches!(err, GsmpError::PreconditionViolation { .. }));
    }

    #[test]
    fn disable_of_unknown_key_is_a_no_op() {
        let mut sampler: FirstToFire<&str> = FirstToFire::new();
        assert!(sampler.disable(&"ghost", 0.0).is_ok());
    }

    #[test]
    fn remove_then_reinsert_keeps_heap_consistent() {
        let mut sampler = FirstToFire::new();
        let mut rng = SmallRngHandle::seeded(11);
        for k in 0..20 {
            sampler
                .enable(k, Box::new(Exponential::new(1.0 + k as f64)), 0.0, 0.0, &mut rng)
                .unwrap();
        }
        for k in (0..20).step_by(2) {
            sampler.fire(&k, 0.0).unwrap();
        }
        assert_eq!(sampler.length(), 10);
        let (tau, _) = sampler.next(0.0, &mut rng).unwrap();
        assert!(tau.is_finite());
    }
}
