//! The user-facing facade: composes one sampling "method"
//! ([`crate::samplers`]) with an optional likelihood watcher and an
//! optional Common-Random-Numbers wrapper.
//!
//! Composition is by type substitution — not-requested components are
//! absent, not present-and-idle — the same strategy-parameter pattern
//! used for generic tree-building code with a `PhantomData<S>` scheme
//! marker:
//! - The CRN axis is `C: SamplerCore<K, R>`, implemented once generically
//!   for any [`GsmpSampler`] and once for [`CommonRandomRecorder`] — a
//!   context built over the former pays nothing for CRN machinery it
//!   never asked for.
//! - The likelihood axis is `W: WatcherSlot<K>`, implemented for `()`
//!   (every method a no-op returning `None`) and for [`PathLikelihoods`].
//!   `()` has no fields, so a context without `path_likelihood` carries
//!   no watcher state at all.

use crate::crn::CommonRandomRecorder;
use crate::distribution::Distribution;
use crate::error::{GsmpError, GsmpResult};
use crate::rng::{Forkable, GsmpRng};
use crate::samplers::GsmpSampler;
use crate::watcher::PathLikelihoods;
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;

/// Unifies a bare [`GsmpSampler`] and a [`CommonRandomRecorder`] behind
/// one call shape taking the concrete RNG type `R` directly, since
/// `CommonRandomRecorder` needs `R`'s associated `State` for
/// capture/restore and so cannot be driven through `&mut dyn RngCore`.
pub trait SamplerCore<K, R>
where
    K: Eq + Hash + Clone + Debug,
    R: GsmpRng,
{
    fn enable(
        &mut self,
        key: K,
        distribution: Box<dyn Distribution>,
        te: f64,
        when: f64,
        rng: &mut R,
    ) -> GsmpResult<()>;
    fn disable(&mut self, key: &K, when: f64) -> GsmpResult<()>;
    fn fire(&mut self, key: &K, when: f64) -> GsmpResult<()>;
    fn next(&mut self, now: f64, rng: &mut R) -> Option<(f64, K)>;
    fn reset(&mut self);
    fn length(&self) -> usize;
    fn keys(&self) -> Vec<K>;
    fn isenabled(&self, key: &K) -> bool;
}

impl<K, S, R> SamplerCore<K, R> for S
where
    K: Eq + Hash + Clone + Debug,
    S: GsmpSampler<K>,
    R: GsmpRng,
{
    fn enable(
        &mut self,
        key: K,
        distribution: Box<dyn Distribution>,
        te: f64,
        when: f64,
        rng: &mut R,
    ) -> GsmpResult<()> {
        GsmpSampler::enable(self, key, distribution, te, when, rng)
    }

    fn disable(&mut self, key: &K, when: f64) -> GsmpResult<()> {
        GsmpSampler::disable(self, key, when)
    }

    fn fire(&mut self, key: &K, when: f64) -> GsmpResult<()> {
        GsmpSampler::fire(self, key, when)
    }

    fn next(&mut self, now: f64, rng: &mut R) -> Option<(f64, K)> {
        GsmpSampler::next(self, now, rng)
    }

    fn reset(&mut self) {
        GsmpSampler::reset(self)
    }

    fn length(&self) -> usize {
        GsmpSampler::length(self)
    }

    fn keys(&self) -> Vec<K> {
        GsmpSampler::keys(self)
    }

    fn isenabled(&self, key: &K) -> bool {
        GsmpSampler::isenabled(self, key)
    }
}

impl<K, S, R> SamplerCore<K, R> for CommonRandomRecorder<K, S, R>
where
    K: Eq + Hash + Clone + Debug,
    S: GsmpSampler<K>,
    R: GsmpRng,
{
    fn enable(
        &mut self,
        key: K,
        distribution: Box<dyn Distribution>,
        te: f64,
        when: f64,
        rng: &mut R,
    ) -> GsmpResult<()> {
        CommonRandomRecorder::enable(self, key, distribution, te, when, rng)
    }

    fn disable(&mut self, key: &K, when: f64) -> GsmpResult<()> {
        CommonRandomRecorder::disable(self, key, when)
    }

    fn fire(&mut self, key: &K, when: f64) -> GsmpResult<()> {
        CommonRandomRecorder::fire(self, key, when)
    }

    fn next(&mut self, now: f64, rng: &mut R) -> Option<(f64, K)> {
        CommonRandomRecorder::next(self, now, rng)
    }

    fn reset(&mut self) {
        CommonRandomRecorder::reset(self)
    }

    fn length(&self) -> usize {
        CommonRandomRecorder::length(self)
    }

    fn keys(&self) -> Vec<K> {
        CommonRandomRecorder::keys(self)
    }

    fn isenabled(&self, key: &K) -> bool {
        CommonRandomRecorder::isenabled(self, key)
    }
}

/// The watcher axis of composition: `()` for "no likelihood tracking
/// requested" (every method a no-op, `None` returned where a real
/// watcher would answer), [`PathLikelihoods`] when `path_likelihood` or
/// `likelihood_cnt > 1` was requested at build time.
pub trait WatcherSlot<K: Eq + Hash + Clone + Debug> {
    fn on_enable(
        &mut self,
        key: K,
        distributions: Vec<Box<dyn Distribution>>,
        te: f64,
        when: f64,
    ) -> GsmpResult<()>;
    fn on_disable(&mut self, key: &K, when: f64);
    fn on_fire(&mut self, key: &K, when: f64);
    fn pathloglikelihoods(&self, t_end: f64) -> Option<Vec<f64>>;
    fn steploglikelihoods(&self, now: f64, tau: f64, firing_key: &K) -> Option<Vec<f64>>;
    fn reset(&mut self);
}

impl<K: Eq + Hash + Clone + Debug> WatcherSlot<K> for () {
    fn on_enable(&mut self, _: K, _: Vec<Box<dyn Distribution>>, _: f64, _: f64) -> GsmpResult<()> {
        Ok(())
    }
    fn on_disable(&mut self, _key: &K, _when: f64) {}
    fn on_fire(&mut self, _key: &K, _when: f64) {}
    fn pathloglikelihoods(&self, _t_end: f64) -> Option<Vec<f64>> {
        None
    }
    fn steploglikelihoods(&self, _now: f64, _tau: f64, _firing_key: &K) -> Option<Vec<f64>> {
        None
    }
    fn reset(&mut self) {}
}

impl<K: Eq + Hash + Clone + Debug> WatcherSlot<K> for PathLikelihoods<K> {
    fn on_enable(
        &mut self,
        key: K,
        distributions: Vec<Box<dyn Distribution>>,
        te: f64,
        when: f64,
    ) -> GsmpResult<()> {
        self.enable(key, distributions, te, when)
    }
    fn on_disable(&mut self, key: &K, when: f64) {
        self.disable(key, when)
    }
    fn on_fire(&mut self, key: &K, when: f64) {
        self.fire(key, when)
    }
    fn pathloglikelihoods(&self, t_end: f64) -> Option<Vec<f64>> {
        Some(self.pathloglikelihoods(t_end))
    }
    fn steploglikelihoods(&self, now: f64, tau: f64, firing_key: &K) -> Option<Vec<f64>> {
        Some(self.steploglikelihoods(now, tau, firing_key))
    }
    fn reset(&mut self) {
        self.reset()
    }
}

/// Composes a sampler core `C`, an RNG `R`, and an optional watcher `W`
/// behind one enable/disable/fire/next contract.
///
/// `split_weight` starts at `1.0`; [`SamplingContext::split`] divides it
/// by the branching factor on every call, so it combines multiplicatively
/// across repeated splits.
#[derive(Debug, Clone)]
pub struct SamplingContext<K, C, R, W = ()>
where
    K: Eq + Hash + Clone + Debug,
    C: SamplerCore<K, R>,
    R: GsmpRng,
    W: WatcherSlot<K>,
{
    core: C,
    rng: R,
    watcher: W,
    now: f64,
    split_weight: f64,
    _key: PhantomData<K>,
}

impl<K, C, R, W> SamplingContext<K, C, R, W>
where
    K: Eq + Hash + Clone + Debug,
    C: SamplerCore<K, R>,
    R: GsmpRng,
    W: WatcherSlot<K>,
{
    fn check_not_in_past(&self, when: f64, verb: &str, key: &K) -> GsmpResult<()> {
        if when < self.now {
            return Err(GsmpError::precondition(format!(
                "{verb} of {key:?} at when={when} precedes current time {}",
                self.now
            )));
        }
        Ok(())
    }

    /// Registers a new clock. Precondition: `when >=` the context's
    /// current time on re-enable; `key` not already enabled (enforced
    /// by `core`).
    pub fn enable(
        &mut self,
        key: K,
        distribution: Box<dyn Distribution>,
        te: f64,
        when: f64,
    ) -> GsmpResult<()> {
        self.check_not_in_past(when, "enable", &key)?;
        let mirrored = distribution.boxed_clone();
        self.core.enable(key.clone(), distribution, te, when, &mut self.rng)?;
        self.watcher.on_enable(key, vec![mirrored], te, when)
    }

    /// Vectorized enable for importance sampling: the
    /// sampler core is driven by `distributions[0]` (the sampling
    /// proposal); every distribution in the vector is scored in
    /// parallel by the watcher, when one is configured.
    pub fn enable_many(
        &mut self,
        key: K,
        distributions: Vec<Box<dyn Distribution>>,
        te: f64,
        when: f64,
    ) -> GsmpResult<()> {
        self.check_not_in_past(when, "enable", &key)?;
        let driving = distributions
            .first()
            .ok_or_else(|| GsmpError::precondition("enable_many requires at least one distribution"))?
            .boxed_clone();
        self.core.enable(key.clone(), driving, te, when, &mut self.rng)?;
        self.watcher.on_enable(key, distributions, te, when)
    }

    /// No-op if `key` is not enabled.
    pub fn disable(&mut self, key: &K, when: f64) -> GsmpResult<()> {
        self.check_not_in_past(when, "disable", key)?;
        self.core.disable(key, when)?;
        self.watcher.on_disable(key, when);
        Ok(())
    }

    /// Precondition: `key` enabled, `when >=` current time. Advances the
    /// context's notion of "now" to `when`.
    pub fn fire(&mut self, key: &K, when: f64) -> GsmpResult<()> {
        self.check_not_in_past(when, "fire", key)?;
        self.core.fire(key, when)?;
        self.watcher.on_fire(key, when);
        self.now = when;
        Ok(())
    }

    /// The earliest firing time and key among enabled clocks, or `None`
    /// on an empty (or all-`Never`) enabled set.
    pub fn next(&mut self) -> Option<(f64, K)> {
        self.core.next(self.now, &mut self.rng)
    }

    /// Clears all clock state (both `core` and any watcher); CRN
    /// snapshots, if the core is a [`CommonRandomRecorder`], survive —
    /// that reset semantics lives on the recorder itself, not here.
    pub fn reset(&mut self) {
        self.core.reset();
        self.watcher.reset();
        self.now = 0.0;
    }

    pub fn time(&self) -> f64 {
        self.now
    }

    pub fn length(&self) -> usize {
        self.core.length()
    }

    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    pub fn keys(&self) -> Vec<K> {
        self.core.keys()
    }

    pub fn isenabled(&self, key: &K) -> bool {
        self.core.isenabled(key)
    }

    pub fn split_weight(&self) -> f64 {
        self.split_weight
    }

    /// Direct access to the sampler core, for operations the facade
    /// doesn't forward — e.g. [`CommonRandomRecorder::freeze`] or
    /// `miss_count`, which have no equivalent on every `C` and so aren't
    /// part of [`SamplerCore`].
    pub fn core(&self) -> &C {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut C {
        &mut self.core
    }

    /// `None` when no watcher was configured at build time; otherwise
    /// the scalar log-likelihood (first and only tracked distribution).
    pub fn pathloglikelihood(&self, t_end: f64) -> Option<f64> {
        self.watcher.pathloglikelihoods(t_end).map(|v| v[0])
    }

    /// The `K`-wide vector form for multi-distribution importance
    /// sampling, via [`crate::watcher::PathLikelihoods`].
    pub fn pathloglikelihoods(&self, t_end: f64) -> Option<Vec<f64>> {
        self.watcher.pathloglikelihoods(t_end)
    }

    pub fn steploglikelihood(&self, tau: f64, firing_key: &K) -> Option<f64> {
        self.watcher
            .steploglikelihoods(self.now, tau, firing_key)
            .map(|v| v[0])
    }

    pub fn steploglikelihoods(&self, tau: f64, firing_key: &K) -> Option<Vec<f64>> {
        self.watcher.steploglikelihoods(self.now, tau, firing_key)
    }

    /// Draws directly from `distribution` using the context's RNG —
    /// used to pick an importance-sampling proposal among several
    /// candidates without routing through `core`.
    pub fn sample_from_distribution(&mut self, distribution: &dyn Distribution) -> f64 {
        distribution.sample(&mut self.rng)
    }

    /// Deep-copies `src`'s clock and watcher state into `self`,
    /// discarding whatever `self` held; `self`'s own RNG is untouched.
    pub fn copy_clocks(&mut self, src: &Self)
    where
        C: Clone,
        W: Clone,
    {
        self.core = src.core.clone();
        self.watcher = src.watcher.clone();
        self.now = src.now;
    }
}

impl<K, C, R, W> SamplingContext<K, C, R, W>
where
    K: Eq + Hash + Clone + Debug,
    C: SamplerCore<K, R> + Clone,
    R: Forkable,
    W: WatcherSlot<K> + Clone,
{
    /// Duplicates state into `n` independent contexts, each with its own
    /// forked RNG stream and a `split_weight` divided by `n` — splits
    /// compose multiplicatively since each child's weight is derived
    /// from its parent's, not reset to `1/n`.
    pub fn split(&mut self, n: usize) -> Vec<Self> {
        assert!(n > 0, "split requires n > 0");
        (0..n)
            .map(|_| Self {
                core: self.core.clone(),
                rng: self.rng.fork(),
                watcher: self.watcher.clone(),
                now: self.now,
                split_weight: self.split_weight / n as f64,
                _key: PhantomData,
            })
            .collect()
    }
}

/// Builds a [`SamplingContext`] by attaching optional features to a
/// sampler core via a `PhantomData`-parameterized strategy type that
/// changes the built type's shape rather than its runtime branching.
pub struct SamplingContextBuilder<K, C, R, W = ()>
where
    K: Eq + Hash + Clone + Debug,
    C: SamplerCore<K, R>,
    R: GsmpRng,
    W: WatcherSlot<K>,
{
    core: C,
    rng: R,
    watcher: W,
    now: f64,
    _key: PhantomData<K>,
}

impl<K, C, R> SamplingContextBuilder<K, C, R, ()>
where
    K: Eq + Hash + Clone + Debug,
    C: SamplerCore<K, R>,
    R: GsmpRng,
{
    /// Starts from a bare sampler method and RNG; no watcher, no CRN.
    /// Wrap `core` in a [`CommonRandomRecorder`] before calling this to
    /// opt into variance reduction — that's a type substitution on `C`,
    /// not a builder flag.
    pub fn new(core: C, rng: R) -> Self {
        Self {
            core,
            rng,
            watcher: (),
            now: 0.0,
            _key: PhantomData,
        }
    }

    /// Attaches a [`PathLikelihoods`] of the given width (1 for a single
    /// trajectory likelihood, >1 for importance-sampling weight vectors),
    /// realized as a type change on `W` rather than a runtime branch.
    pub fn with_path_likelihood(
        self,
        width: usize,
    ) -> SamplingContextBuilder<K, C, R, PathLikelihoods<K>> {
        SamplingContextBuilder {
            core: self.core,
            rng: self.rng,
            watcher: PathLikelihoods::new(width),
            now: self.now,
            _key: PhantomData,
        }
    }
}

impl<K, C, R, W> SamplingContextBuilder<K, C, R, W>
where
    K: Eq + Hash + Clone + Debug,
    C: SamplerCore<K, R>,
    R: GsmpRng,
    W: WatcherSlot<K>,
{
    pub fn starting_at(mut self, now: f64) -> Self {
        self.now = now;
        self
    }

    pub fn build(self) -> SamplingContext<K, C, R, W> {
        SamplingContext {
            core: self.core,
            rng: self.rng,
            watcher: self.watcher,
            now: self.now,
            split_weight: 1.0,
            _key: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::{Exponential, Never};
    use crate::rng::SmallRngHandle;
    use crate::samplers::FirstToFire;

    type Plain = SamplingContext<&'static str, FirstToFire<&'static str>, SmallRngHandle>;

    fn plain_context(seed: u64) -> Plain {
        SamplingContextBuilder::new(FirstToFire::new(), SmallRngHandle::seeded(seed)).build()
    }

    #[test]
    fn enable_fire_advances_now_i4() {
        let mut ctx = plain_context(1);
        ctx.enable("a", Box::new(Exponential::new(1.0)), 0.0, 0.0).unwrap();
        let (tau, key) = ctx.next().unwrap();
        ctx.fire(&key, tau).unwrap();
        assert_eq!(ctx.time(), tau);
        assert!(!ctx.isenabled(&"a"));
    }

    #[test]
    fn next_is_idempotent_until_a_state_change_l2() {
        let mut ctx = plain_context(2);
        ctx.enable("a", Box::new(Exponential::new(1.0)), 0.0, 0.0).unwrap();
        let first = ctx.next();
        let second = ctx.next();
        assert_eq!(first, second);
    }

    #[test]
    fn disable_before_current_time_is_rejected() {
        let mut ctx = plain_context(3);
        ctx.enable("a", Box::new(Exponential::new(1.0)), 0.0, 0.0).unwrap();
        ctx.enable("b", Box::new(Exponential::new(1.0)), 0.0, 0.0).unwrap();
        ctx.fire(&"a", 2.0).unwrap();
        let err = ctx.disable(&"b", 1.0).unwrap_err();
        assert!(matches!(err, GsmpError::PreconditionViolation { .. }));
    }

    #[test]
    fn enable_disable_is_a_noop_on_the_enabled_set_l1() {
        let mut ctx = plain_context(4);
        ctx.enable("a", Box::new(Exponential::new(1.0)), 0.0, 0.0).unwrap();
        ctx.disable(&"a", 0.0).unwrap();
        assert!(!ctx.isenabled(&"a"));
        assert_eq!(ctx.length(), 0);
    }

    #[test]
    fn never_clock_is_isenabled_but_absent_from_next_b2() {
        let mut ctx = plain_context(5);
        ctx.enable("never", Box::new(Never), 0.0, 0.0).unwrap();
        assert!(ctx.isenabled(&"never"));
        assert!(ctx.next().is_none());
    }

    #[test]
    fn no_watcher_means_no_likelihood_s5_precondition() {
        let ctx = plain_context(6);
        assert!(ctx.pathloglikelihood(10.0).is_none());
    }

    #[test]
    fn path_likelihood_tracks_an_empty_path_l3() {
        type Watched =
            SamplingContext<&'static str, FirstToFire<&'static str>, SmallRngHandle, PathLikelihoods<&'static str>>;
        let mut ctx: Watched =
            SamplingContextBuilder::new(FirstToFire::new(), SmallRngHandle::seeded(7))
                .with_path_likelihood(1)
                .build();
        ctx.enable("a", Box::new(Exponential::new(1.0)), 0.0, 0.0).unwrap();
        ctx.enable("b", Box::new(Exponential::new(2.0)), 0.0, 0.0).unwrap();
        let t_end = 3.0;
        let expected = (-1.0_f64 * t_end) + (-2.0_f64 * t_end);
        assert!((ctx.pathloglikelihood(t_end).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn split_divides_weight_multiplicatively_s6() {
        let mut ctx = plain_context(8);
        ctx.enable("a", Box::new(Exponential::new(1.0)), 0.0, 0.0).unwrap();
        let mut children = ctx.split(3);
        assert_eq!(children.len(), 3);
        for child in &children {
            assert!((child.split_weight() - 1.0 / 3.0).abs() < 1e-12);
            assert!(child.isenabled(&"a"));
        }
        let grandchildren = children[0].split(2);
        assert!((grandchildren[0].split_weight() - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn split_children_have_independent_rng_streams() {
        let mut ctx = plain_context(9);
        ctx.enable("a", Box::new(Exponential::new(1.0)), 0.0, 0.0).unwrap();
        let mut children = ctx.split(2);
        let a = children[0].next();
        let b = children[1].next();
        // same clock, same quantile-free sampler (FirstToFire redraws at
        // enable, already fixed before split) -> taus are identical here,
        // but the underlying RNG streams must differ for anything drawn
        // *after* the split. Exercise that directly:
        let draw_a = children[0].sample_from_distribution(&Exponential::new(1.0));
        let draw_b = children[1].sample_from_distribution(&Exponential::new(1.0));
        assert_ne!(draw_a, draw_b);
        assert_eq!(a, b); // sanity: both inherited the same pre-split tau
    }

    #[test]
    fn copy_clocks_deep_copies_state() {
        let mut src = plain_context(10);
        src.enable("a", Box::new(Exponential::new(1.0)), 0.0, 0.0).unwrap();
        let mut dst = plain_context(11);
        dst.copy_clocks(&src);
        assert!(dst.isenabled(&"a"));
        dst.fire(&"a", 5.0).unwrap();
        assert!(src.isenabled(&"a"), "copy must be a deep copy, not shared state");
    }
}
