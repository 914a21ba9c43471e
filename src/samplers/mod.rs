//! The four sampling engines plus the hierarchical composition of
//! [`MultiSampler`], unified behind one capability trait.
//!
//! Heterogeneous runtime composition ([`MultiSampler`]'s children) uses
//! a tagged enum rather than trait objects, since the concrete sampler
//! set is closed.

mod combined_next_reaction;
mod direct_call;
mod first_reaction;
mod first_to_fire;
mod heap;
mod multi;

pub use combined_next_reaction::CombinedNextReaction;
pub use direct_call::DirectCall;
pub use first_reaction::FirstReaction;
pub use first_to_fire::FirstToFire;
pub use multi::{Child, MultiSampler, MultipleDirect};

use crate::distribution::Distribution;
use crate::error::GsmpResult;
use crate::rng::RngCore;
use std::hash::Hash;

/// Everything recorded about one enabled clock: its distribution,
/// zero-reference `te`, and the simulation time `when` it was
/// (re-)enabled.
#[derive(Debug, Clone)]
pub struct EnablingEntry {
    pub distribution: Box<dyn Distribution>,
    pub te: f64,
    pub when: f64,
}

impl EnablingEntry {
    pub fn new(distribution: Box<dyn Distribution>, te: f64, when: f64) -> Self {
        Self {
            distribution,
            te,
            when,
        }
    }

    /// The left-truncation shift `(when - te).max(0.0)` used throughout
    /// the Next-Reaction quantile carriers and the shift-aware likelihood
    /// corrections.
    pub fn shift(&self) -> f64 {
        (self.when - self.te).max(0.0)
    }
}

/// Shared capability trait for every concrete sampler:
/// enable/disable/fire/next plus the bookkeeping operations a
/// [`crate::context::SamplingContext`] needs.
pub trait GsmpSampler<K: Eq + Hash + Clone + std::fmt::Debug> {
    /// Registers a new clock. Precondition: `key` is not currently
    /// enabled — re-enabling without an intervening disable/fire is
    /// a [`crate::error::GsmpError::PreconditionViolation`].
    fn enable(
        &mut self,
        key: K,
        distribution: Box<dyn Distribution>,
        te: f64,
        when: f64,
        rng: &mut dyn RngCore,
    ) -> GsmpResult<()>;

    /// No-op if `key` is not enabled, generalized to every sampler for a
    /// uniform contract.
    fn disable(&mut self, key: &K, when: f64) -> GsmpResult<()>;

    /// Precondition: `key` is enabled. Removes the clock.
    fn fire(&mut self, key: &K, when: f64) -> GsmpResult<()>;

    /// The earliest firing time and key among enabled clocks, or `None`
    /// on an empty (or all-`Never`) enabled set.
    fn next(&mut self, now: f64, rng: &mut dyn RngCore) -> Option<(f64, K)>;

    /// Clears all clock state.
    fn reset(&mut self);

    fn length(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.length() == 0
    }

    /// Currently-enabled keys, in no particular order.
    fn keys(&self) -> Vec<K>;

    fn isenabled(&self, key: &K) -> bool;

    /// Deep-copies `src`'s clock state into `self`, discarding whatever
    /// `self` held. Not a capability-trait method dispatched through
    /// `dyn` — every concrete sampler is `Clone`, so this is just
    /// `*self = src.clone()`; expressed here for a uniform call site.
    fn copy_clocks(&mut self, src: &Self)
    where
        Self: Sized + Clone,
    {
        *self = src.clone();
    }
}
