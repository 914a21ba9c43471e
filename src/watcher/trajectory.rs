use super::PathLikelihoods;
use crate::distribution::Distribution;
use crate::error::GsmpResult;
use std::fmt::Debug;
use std::hash::Hash;

/// The single-distribution case of [`PathLikelihoods`]: one running
/// log-likelihood, scalar accessors instead of length-1 vectors.
#[derive(Debug, Clone)]
pub struct TrajectoryWatcher<K: Eq + Hash + Clone + Debug> {
    inner: PathLikelihoods<K>,
}

impl<K: Eq + Hash + Clone + Debug> Default for TrajectoryWatcher<K> {
    fn default() -> Self {
        Self {
            inner: PathLikelihoods::new(1),
        }
    }
}

impl<K: Eq + Hash + Clone + Debug> TrajectoryWatcher<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(&mut self, key: K, distribution: Box<dyn Distribution>, te: f64, when: f64) -> GsmpResult<()> {
        self.inner.enable(key, vec![distribution], te, when)
    }

    pub fn disable(&mut self, key: &K, when: f64) {
        self.inner.disable(key, when);
    }

    pub fn fire(&mut self, key: &K, when: f64) {
        self.inner.fire(key, when);
    }

    pub fn pathloglikelihood(&self, t_end: f64) -> f64 {
        self.inner.pathloglikelihoods(t_end)[0]
    }

    pub fn steploglikelihood(&self, now: f64, tau: f64, firing_key: &K) -> f64 {
        self.inner.steploglikelihoods(now, tau, firing_key)[0]
    }

    pub fn loglikelihood(&self) -> f64 {
        self.inner.loglikelihoods()[0]
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.inner.keys()
    }

    pub fn isenabled(&self, key: &K) -> bool {
        self.inner.isenabled(key)
    }
}
