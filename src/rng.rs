//! Random-number source used by every sampler.
//!
//! Every sampler needs three things from an RNG: a uniform draw, an
//! exponential draw, and opaque capture/restore of its internal state
//! (needed only by [`crate::crn::CommonRandomRecorder`]). `rand`'s
//! `SmallRng` is a small-state xor-shift-family generator and is `Clone`,
//! so capture/restore is just cloning it — no serialization format needed
//! since the snapshot never leaves process memory.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand_distr::Distribution as _;
use rand_distr::Exp1;

/// Draws a uniform in `(0, 1)` or a standard exponential.
///
/// Split out from [`GsmpRng`] so that distributions and samplers, which
/// never need capture/restore, can take `&mut dyn RngCore` — `GsmpRng`'s
/// associated `State` type makes it impossible to use as a trait object.
///
/// No process-wide default is provided; callers construct one explicitly
/// (typically [`SmallRngHandle::seeded`])
/// and thread it through the [`crate::SamplingContext`] explicitly.
pub trait RngCore {
    /// Draws a uniform value in the open interval `(0, 1)`.
    fn uniform01(&mut self) -> f64;
    /// Draws a standard exponential (rate 1) variate.
    fn exponential1(&mut self) -> f64;
}

/// Full RNG contract including opaque state capture/restore, needed only
/// by [`crate::crn::CommonRandomRecorder`]. Not object-safe — used as a
/// generic bound, never as `dyn GsmpRng`.
pub trait GsmpRng: RngCore {
    /// Opaque snapshot of this generator's internal state.
    type State: Clone;

    /// Snapshots the current internal state.
    fn capture(&self) -> Self::State;
    /// Overwrites the internal state with a previously captured snapshot.
    fn restore(&mut self, state: &Self::State);
}

/// Default [`GsmpRng`] implementation backed by `rand::rngs::SmallRng`.
#[derive(Debug, Clone)]
pub struct SmallRngHandle(SmallRng);

impl SmallRngHandle {
    /// Seeds a new handle deterministically from a `u64`.
    pub fn seeded(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }

    /// Seeds a new handle from OS entropy.
    pub fn from_entropy() -> Self {
        Self(SmallRng::from_os_rng())
    }
}

impl RngCore for SmallRngHandle {
    fn uniform01(&mut self) -> f64 {
        // `Rng::random` samples [0, 1); reject 0.0 too so -ln(u) and
        // inverse-CDF calls never see either degenerate end.
        loop {
            let u: f64 = self.0.random();
            if u > 0.0 && u < 1.0 {
                return u;
            }
        }
    }

    fn exponential1(&mut self) -> f64 {
        Exp1.sample(&mut self.0)
    }
}

impl GsmpRng for SmallRngHandle {
    type State = SmallRng;

    fn capture(&self) -> Self::State {
        self.0.clone()
    }

    fn restore(&mut self, state: &Self::State) {
        self.0 = state.clone();
    }
}

/// Produces an independent generator derived from `self`, needed only by
/// [`crate::context::SamplingContext::split`]: each of the `N` resulting
/// contexts needs its own RNG stream, not a
/// clone of the parent's, or their draws would be perfectly correlated.
///
/// Kept separate from [`GsmpRng`] rather than folded in: every sampler
/// and distribution only ever needs [`RngCore`]'s two draws, and most
/// `GsmpRng` implementors besides the context-facing handle have no
/// natural notion of "derive a child stream".
pub trait Forkable: GsmpRng + Sized {
    fn fork(&mut self) -> Self;
}

impl Forkable for SmallRngHandle {
    fn fork(&mut self) -> Self {
        let hi = (self.uniform01() * u32::MAX as f64) as u64;
        let lo = (self.uniform01() * u32::MAX as f64) as u64;
        Self::seeded((hi << 32) | lo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_open_interval() {
        let mut rng = SmallRngHandle::seeded(1);
        for _ in 0..10_000 {
            let u = rng.uniform01();
            assert!(u > 0.0 && u < 1.0);
        }
    }

    #[test]
    fn capture_restore_replays_identically() {
        let mut rng = SmallRngHandle::seeded(42);
        let snapshot = rng.capture();
        let first: Vec<f64> = (0..8).map(|_| rng.uniform01()).collect();
        rng.restore(&snapshot);
        let second: Vec<f64> = (0..8).map(|_| rng.uniform01()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn forked_streams_diverge_from_the_parent() {
        let mut parent = SmallRngHandle::seeded(13);
        let mut child = parent.fork();
        let parent_draws: Vec<f64> = (0..16).map(|_| parent.uniform01()).collect();
        let child_draws: Vec<f64> = (0..16).map(|_| child.uniform01()).collect();
        assert_ne!(parent_draws, child_draws);
    }

    #[test]
    fn seeded_is_deterministic() {
        let mut a = SmallRngHandle::seeded(7);
        let mut b = SmallRngHandle::seeded(7);
        for _ in 0..100 {
            assert_eq!(a.uniform01(), b.uniform01());
        }
    }
}
