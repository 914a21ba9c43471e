//! The univariate distribution surface a GSMP sampler needs, realized
//! in-crate rather than depending on an external statistics crate,
//! because the operations are narrow (log-space survival and its
//! inverse, shift-aware sampling) and every sampler in this crate is
//! exercised against the four concrete distributions below.

mod erlang;
mod exponential;
mod never;
mod weibull;

pub use erlang::Erlang;
pub use exponential::Exponential;
pub use never::Never;
pub use weibull::Weibull;

use crate::rng::RngCore;

impl Clone for Box<dyn Distribution> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}

/// Inverts a monotonically decreasing survival function by bisection.
///
/// Shared by distributions (Erlang) whose CCDF has no closed-form
/// inverse. Expands the search bracket geometrically until it contains
/// the root, then bisects for `iterations` steps — plenty for `f64`
/// precision on a smooth monotone function.
pub(crate) fn bisect_invccdf(ccdf: impl Fn(f64) -> f64, q: f64) -> f64 {
    debug_assert!(q > 0.0 && q < 1.0, "invccdf precondition: 0 < q < 1");
    let mut hi = 1.0_f64;
    while ccdf(hi) > q {
        hi *= 2.0;
        if hi > 1e18 {
            break;
        }
    }
    let mut lo = 0.0_f64;
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if ccdf(mid) > q {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

/// Which numeric space a distribution's Next-Reaction state should be
/// tracked in.
///
/// `Log` is exact and fast for the exponential family (constant or
/// piecewise-constant hazard integrates in closed form); everything else
/// falls back to `Linear`, which tracks a literal survival factor and
/// inverts it via [`Distribution::invccdf`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Space {
    Log,
    Linear,
}

/// A continuous univariate distribution over elapsed time since a
/// clock's enabling reference `te`.
///
/// Every method here is in terms of elapsed time `t = now - te`, never
/// absolute simulation time — shift handling (when `te < when`) is the
/// caller's responsibility (see [`crate::nr`] and
/// [`crate::samplers::first_to_fire`]) — a clock's distribution is never
/// implicitly shifted.
///
/// Deliberately not `: Clone` — a `Self`-returning supertrait would make
/// `dyn Distribution` unusable, and samplers need to hold heterogeneous
/// distributions behind one trait object per clock. [`Distribution::boxed_clone`]
/// gives the "distributions are copied on enable" value semantics instead.
pub trait Distribution: std::fmt::Debug {
    /// Draws an elapsed time `t >= 0` from this distribution.
    fn sample(&self, rng: &mut dyn RngCore) -> f64;

    /// `log f(t)`, the log-density at elapsed time `t`.
    fn logpdf(&self, t: f64) -> f64;

    /// `log(1 - F(t))`, the log-survival function.
    fn logccdf(&self, t: f64) -> f64;

    /// `1 - F(t)`, the survival function.
    fn ccdf(&self, t: f64) -> f64 {
        self.logccdf(t).exp()
    }

    /// The inverse of the survival function: given `q` in `(0, 1)`,
    /// returns `t` such that `ccdf(t) == q`.
    fn invccdf(&self, q: f64) -> f64;

    /// For exponential-family distributions, the constant hazard rate.
    /// `None` for distributions whose hazard varies with elapsed time.
    fn rate(&self) -> Option<f64> {
        None
    }

    /// Which [`Space`] this distribution's Next-Reaction state should be
    /// tracked in. Defaults to `Linear`; exponential-family members
    /// override to `Log`.
    fn space(&self) -> Space {
        Space::Linear
    }

    /// Draws an elapsed time conditioned on survival past `shift` (the
    /// left-truncation point `when - te` when `te < when`).
    ///
    /// `F(t) = U * (1 - F(shift)) + F(shift)` inverted via the survival
    /// function: `ccdf(t) = U * ccdf(shift)`.
    fn sample_shifted(&self, shift: f64, rng: &mut dyn RngCore) -> f64 {
        if shift <= 0.0 {
            return self.sample(rng);
        }
        let u = rng.uniform01();
        let q = u * self.ccdf(shift);
        self.invccdf(q)
    }

    /// Clones into a fresh trait object. Every concrete distribution is
    /// `Clone` itself; this just forwards to it.
    fn boxed_clone(&self) -> Box<dyn Distribution>;
}
