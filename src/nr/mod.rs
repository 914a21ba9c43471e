//! Per-clock state for the Next-Reaction family: a small
//! record that lets [`crate::samplers::CombinedNextReaction`] reuse a
//! clock's original uniform draw across re-enables instead of redrawing,
//! which is what makes quantile reuse and Common Random Numbers exact.
//!
//! Dispatch on [`crate::distribution::Space`] picks one of two carriers:
//! log-space (cumulative hazard, exact and fast for the exponential
//! family) or linear-space (literal survival factor, the general
//! fallback via [`Distribution::invccdf`]).

use crate::distribution::{Distribution, Space};
use crate::error::{GsmpError, GsmpResult};
use crate::rng::RngCore;

/// The consumed-hazard-or-survival carrier for one enabled clock.
///
/// All times stored here are *elapsed* time since the clock's `te`, not
/// absolute simulation time — callers convert at the boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NRTransition {
    /// Cumulative hazard consumed so far, plus the fixed
    /// `-log(1-U)` quantile drawn at first enable.
    Log { quantile: f64 },
    /// Residual survival probability remaining to be "spent" before the
    /// clock fires.
    Linear { residual: f64 },
}

impl NRTransition {
    /// Draws a fresh record on first enable, honoring left-truncation at
    /// `shift = (when - te).max(0.0)` via the shifted-sampling rule.
    /// Returns the elapsed putative firing time and the record to store.
    pub fn sample(
        dist: &dyn Distribution,
        shift: f64,
        rng: &mut dyn RngCore,
    ) -> (f64, NRTransition) {
        let shift = shift.max(0.0);
        match dist.space() {
            Space::Log => {
                let mut quantile = rng.exponential1();
                if shift > 0.0 {
                    quantile -= dist.logccdf(shift);
                }
                let elapsed = Self::invert_log(dist, quantile);
                (elapsed, NRTransition::Log { quantile })
            }
            Space::Linear => {
                let u = rng.uniform01();
                let residual = if shift > 0.0 {
                    u * dist.ccdf(shift)
                } else {
                    u
                };
                (dist.invccdf(residual), NRTransition::Linear { residual })
            }
        }
    }

    /// `ccdf(t) == exp(-quantile)`, inverted via `invccdf`.
    fn invert_log(dist: &dyn Distribution, quantile: f64) -> f64 {
        dist.invccdf((-quantile).exp())
    }

    /// The clock's distribution changed at elapsed time `t_now` without
    /// firing (it was enabled at `t_prev`'s distribution up to now);
    /// subtracts the hazard/survival consumed over `[t_prev, t_now]`
    /// under the *old* distribution.
    ///
    /// Precondition: `dist_old.space()` matches `self`'s variant — a
    /// space-changing re-enable must resample via
    /// [`NRTransition::sample`] instead of calling this.
    pub fn consume(
        self,
        dist_old: &dyn Distribution,
        t_prev: f64,
        t_now: f64,
        clock: &str,
    ) -> GsmpResult<NRTransition> {
        match self {
            NRTransition::Log { quantile } => {
                if dist_old.space() != Space::Log {
                    return Err(GsmpError::mismatch(
                        clock,
                        "consume() called with a linear-space distribution against a log-space record",
                    ));
                }
                let consumed = dist_old.logccdf(t_prev) - dist_old.logccdf(t_now);
                Ok(NRTransition::Log {
                    // floating-point drift can push this fractionally
                    // negative; clip rather than error.
                    quantile: (quantile - consumed).max(0.0),
                })
            }
            NRTransition::Linear { residual } => {
                if dist_old.space() != Space::Linear {
                    return Err(GsmpError::mismatch(
                        clock,
                        "consume() called with a log-space distribution against a linear-space record",
                    ));
                }
                let before = dist_old.ccdf(t_prev);
                let after = dist_old.ccdf(t_now);
                let factor = if before > 0.0 { after / before } else { 0.0 };
                Ok(NRTransition::Linear {
                    residual: (residual * factor).clamp(0.0, 1.0),
                })
            }
        }
    }

    /// Recomputes the elapsed putative firing time under `dist`, the
    /// distribution currently in force for this clock.
    pub fn putative(&self, dist: &dyn Distribution, clock: &str) -> GsmpResult<f64> {
        match (self, dist.space()) {
            (NRTransition::Log { quantile }, Space::Log) => Ok(Self::invert_log(dist, *quantile)),
            (NRTransition::Linear { residual }, Space::Linear) => Ok(dist.invccdf(*residual)),
            _ => Err(GsmpError::mismatch(
                clock,
                "putative() called across a space mismatch; re-sample instead",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::{Exponential, Weibull};
    use crate::rng::SmallRngHandle;

    #[test]
    fn log_space_putative_matches_sampled_tau() {
        let dist = Exponential::new(2.0);
        let mut rng = SmallRngHandle::seeded(1);
        let (tau, record) = NRTransition::sample(&dist, 0.0, &mut rng);
        let replayed = record.putative(&dist, "clock").unwrap();
        assert!((tau - replayed).abs() < 1e-12);
    }

    #[test]
    fn consume_then_putative_is_consistent_with_direct_resample() {
        // The memoryless property means consuming hazard up to t_prev on
        // an exponential and then asking for a new putative time from
        // t_now should reduce to "still Exp(rate) from here".
        let dist = Exponential::new(1.0);
        let mut rng = SmallRngHandle::seeded(7);
        let (_, record) = NRTransition::sample(&dist, 0.0, &mut rng);
        let consumed = record.consume(&dist, 0.3, 0.3, "clock").unwrap();
        // no elapsed time passed (t_prev == t_now) -> record unchanged
        assert_eq!(record, consumed);
    }

    #[test]
    fn quantile_reuse_survives_a_rate_change() {
        // disabling and re-enabling with the SAME
        // distribution, no intervening fire, yields the same tau.
        let dist = Exponential::new(2.0);
        let mut rng = SmallRngHandle::seeded(42);
        let (tau_a, record) = NRTransition::sample(&dist, 0.0, &mut rng);
        let tau_b = record.putative(&dist, "clock").unwrap();
        assert_eq!(tau_a, tau_b);
    }

    #[test]
    fn mismatched_space_consume_is_rejected() {
        let log_record = NRTransition::Log { quantile: 1.0 };
        let weibull_linear_like = Weibull::new(1.0, 1.0); // still Log space actually
        // force a genuine mismatch using a Linear-space stand-in record
        let linear_record = NRTransition::Linear { residual: 0.5 };
        let err = linear_record.consume(&weibull_linear_like, 0.0, 0.1, "c").unwrap_err();
        assert!(matches!(err, GsmpError::DistributionMismatch { .. }));
        let _ = log_record;
    }
}
