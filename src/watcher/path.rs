use crate::distribution::Distribution;
use crate::error::{GsmpError, GsmpResult};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// One clock's bookkeeping for [`PathLikelihoods`]: a distribution per
/// tracked likelihood, plus the enabling reference needed for the
/// shift-normalized contribution.
#[derive(Debug, Clone)]
struct Tracked {
    distributions: Vec<Box<dyn Distribution>>,
    te: f64,
    when: f64,
}

impl Tracked {
    fn shift(&self) -> f64 {
        (self.when - self.te).max(0.0)
    }
}

/// Maintains `width` running log-likelihoods in parallel, one per
/// distribution a clock might be scored under — supporting importance
/// sampling: sample under q, score under p and q, weight by
/// `exp(log p - log q)`.
///
/// Summation across clocks is naive `f64` summation. Realistic GSMP
/// models track tens to low thousands of clocks, far below where Kahan
/// summation's extra bookkeeping pays for itself; callers who need it
/// can call [`PathLikelihoods::step_contribution`] directly and
/// accumulate however they like.
#[derive(Debug, Clone)]
pub struct PathLikelihoods<K: Eq + Hash + Clone + Debug> {
    entries: HashMap<K, Tracked>,
    loglikelihoods: Vec<f64>,
    width: usize,
}

impl<K: Eq + Hash + Clone + Debug> PathLikelihoods<K> {
    pub fn new(width: usize) -> Self {
        assert!(width > 0, "PathLikelihoods requires at least one distribution");
        Self {
            entries: HashMap::new(),
            loglikelihoods: vec![0.0; width],
            width,
        }
    }

    /// Per-clock, per-distribution conditional-survival contribution at
    /// elapsed time `t`, normalized for left-truncation by `shift`:
    /// `logccdf(t) - logccdf(shift)`.
    fn step_contribution(dist: &dyn Distribution, t: f64, shift: f64) -> f64 {
        dist.logccdf(t.max(0.0)) - dist.logccdf(shift)
    }

    fn fire_contribution(dist: &dyn Distribution, t: f64, shift: f64) -> f64 {
        dist.logpdf(t.max(0.0)) - dist.logccdf(shift)
    }

    pub fn enable(
        &mut self,
        key: K,
        distributions: Vec<Box<dyn Distribution>>,
        te: f64,
        when: f64,
    ) -> GsmpResult<()> {
        if distributions.len() != self.width {
            return Err(GsmpError::precondition(format!(
                "enable of {key:?} carries {} distributions, expected {}",
                distributions.len(),
                self.width
            )));
        }
        self.entries.insert(
            key,
            Tracked {
                distributions,
                te,
                when,
            },
        );
        Ok(())
    }

    pub fn disable(&mut self, key: &K, when: f64) {
        if let Some(tracked) = self.entries.remove(key) {
            let elapsed = when - tracked.te;
            let shift = tracked.shift();
            for (ll, dist) in self.loglikelihoods.iter_mut().zip(&tracked.distributions) {
                *ll += Self::step_contribution(dist.as_ref(), elapsed, shift);
            }
        }
    }

    pub fn fire(&mut self, key: &K, when: f64) {
        if let Some(tracked) = self.entries.remove(key) {
            let elapsed = when - tracked.te;
            let shift = tracked.shift();
            for (ll, dist) in self.loglikelihoods.iter_mut().zip(&tracked.distributions) {
                *ll += Self::fire_contribution(dist.as_ref(), elapsed, shift);
            }
        }
    }

    /// The running log-likelihoods plus, for every still-enabled clock,
    /// its conditional-survival contribution up to `t_end`.
    pub fn pathloglikelihoods(&self, t_end: f64) -> Vec<f64> {
        let mut totals = self.loglikelihoods.clone();
        for tracked in self.entries.values() {
            let elapsed = t_end - tracked.te;
            let shift = tracked.shift();
            for (ll, dist) in totals.iter_mut().zip(&tracked.distributions) {
                *ll += Self::step_contribution(dist.as_ref(), elapsed, shift);
            }
        }
        totals
    }

    /// Log-likelihood of "clock `firing_key` fires next at `tau`", given
    /// the enabled set as of `now`: every other enabled clock contributes
    /// its conditional-survival increment from `now` to `tau`; the
    /// firing clock contributes its conditional density at `tau` instead.
    pub fn steploglikelihoods(&self, now: f64, tau: f64, firing_key: &K) -> Vec<f64> {
        let mut totals = vec![0.0; self.width];
        for (key, tracked) in &self.entries {
            let elapsed_now = (now - tracked.te).max(0.0);
            for (i, dist) in tracked.distributions.iter().enumerate() {
                let base = -dist.logccdf(elapsed_now);
                let elapsed_tau = (tau - tracked.te).max(0.0);
                totals[i] += base
                    + if key == firing_key {
                        dist.logpdf(elapsed_tau)
                    } else {
                        dist.logccdf(elapsed_tau)
                    };
            }
        }
        totals
    }

    pub fn loglikelihoods(&self) -> &[f64] {
        &self.loglikelihoods
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.loglikelihoods = vec![0.0; self.width];
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    pub fn isenabled(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::Exponential;

    #[test]
    fn empty_path_matches_closed_form_survival_sum() {
        // pathloglikelihood for an empty-path run equals
        // Σ logccdf(T_end - te) minus initial shift corrections (zero
        // here since every clock is enabled at its own te).
        let mut pl: PathLikelihoods<&str> = PathLikelihoods::new(1);
        pl.enable("a", vec![Box::new(Exponential::new(1.0))], 0.0, 0.0)
            .unwrap();
        pl.enable("b", vec![Box::new(Exponential::new(2.0))], 0.0, 0.0)
            .unwrap();
        let t_end = 3.0;
        let expected = (-1.0_f64 * t_end) + (-2.0_f64 * t_end);
        assert!((pl.pathloglikelihoods(t_end)[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn fire_then_disable_accumulates_correct_terms() {
        let mut pl: PathLikelihoods<&str> = PathLikelihoods::new(1);
        pl.enable("a", vec![Box::new(Exponential::new(1.0))], 0.0, 0.0)
            .unwrap();
        pl.fire(&"a", 1.0);
        // logpdf(1.0) = ln(1.0) - 1.0*1.0 = -1.0, shift correction is 0
        assert!((pl.loglikelihoods()[0] - (-1.0)).abs() < 1e-12);
        assert!(!pl.isenabled(&"a"));
    }

    #[test]
    fn left_truncation_normalizes_the_initial_shift() {
        let mut pl: PathLikelihoods<&str> = PathLikelihoods::new(1);
        // te = -2, when = 0: left-truncated at shift 2.0
        pl.enable("a", vec![Box::new(Exponential::new(1.0))], -2.0, 0.0)
            .unwrap();
        pl.disable(&"a", 1.0);
        // elapsed = 1.0 - (-2.0) = 3.0; shift = 2.0
        let expected = (-1.0_f64 * 3.0) - (-1.0_f64 * 2.0);
        assert!((pl.loglikelihoods()[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn width_mismatch_is_a_precondition_violation() {
        let mut pl: PathLikelihoods<&str> = PathLikelihoods::new(2);
        let err = pl
            .enable("a", vec![Box::new(Exponential::new(1.0))], 0.0, 0.0)
            .unwrap_err();
        assert!(matches!(err, GsmpError::PreconditionViolation { .. }));
    }
}
