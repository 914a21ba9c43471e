//! Sampler for generalized semi-Markov processes (GSMP).
//!
//! A GSMP model is a dynamically changing bag of *clocks* — independent
//! competing-risks processes, each with its own (possibly non-exponential,
//! possibly time-varying) hazard. This crate owns the stochastic machinery
//! (random-variate generation, survival accounting, priority queueing,
//! likelihood tracking, variance reduction) behind a small enable/disable/
//! fire/next contract; callers own the simulation state and drive the loop.
//!
//! # Layout
//!
//! - [`distribution`] — the univariate distribution surface (§6): sample,
//!   log-density, log-survival, and their inverses.
//! - [`prefix_sum`] and [`keyed`] — the data structures behind the Direct
//!   Method (§4.1–§4.2).
//! - [`nr`] — per-clock state for the Next-Reaction family (§4.3).
//! - [`samplers`] — the four sampling engines plus hierarchical composition
//!   (§4.4–§4.8), unified behind [`samplers::GsmpSampler`].
//! - [`watcher`] — incremental path log-likelihood tracking (§4.9).
//! - [`crn`] — Common Random Numbers variance reduction (§4.10).
//! - [`context`] — the user-facing [`context::SamplingContext`] facade (§4.11)
//!   that composes the above.
//!
//! # Example
//!
//! ```
//! use gsmp::context::SamplingContextBuilder;
//! use gsmp::distribution::Exponential;
//! use gsmp::rng::SmallRngHandle;
//! use gsmp::samplers::FirstToFire;
//!
//! let mut ctx = SamplingContextBuilder::new(FirstToFire::new(), SmallRngHandle::seeded(0)).build();
//! ctx.enable("arrival", Box::new(Exponential::new(2.0)), 0.0, 0.0).unwrap();
//! if let Some((tau, key)) = ctx.next() {
//!     ctx.fire(&key, tau).unwrap();
//!     assert_eq!(key, "arrival");
//! }
//! ```

pub mod context;
pub mod crn;
pub mod distribution;
pub mod error;
pub mod keyed;
pub mod nr;
pub mod prefix_sum;
pub mod rng;
pub mod samplers;
pub mod watcher;

pub use context::{SamplingContext, SamplingContextBuilder};
pub use distribution::Distribution;
pub use error::{GsmpError, GsmpResult};
pub use rng::{Forkable, GsmpRng, RngCore, SmallRngHandle};
pub use samplers::{
    Child, CombinedNextReaction, DirectCall, FirstReaction, FirstToFire, GsmpSampler, MultiSampler,
    MultipleDirect,
};
