//! Error taxonomy for the sampler core.
//!
//! `next()` returning "no event" is not an error — see [`crate::GsmpSampler::next`],
//! which returns `Option`, not `Result`. Everything in this enum is a caller
//! mistake or a numerical failure, never a normal terminal outcome.

use thiserror::Error;

/// Errors surfaced by clock and sampler operations.
///
/// Nothing here is fatal to the process; the documented recovery is to
/// discard the sampler that produced the error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GsmpError {
    /// Firing a disabled key, disabling before the current time, enabling
    /// twice at the same key without an intervening disable/fire, or
    /// feeding a non-exponential distribution to [`crate::DirectCall`].
    #[error("precondition violation: {detail}")]
    PreconditionViolation { detail: String },

    /// A distribution was fed to a component (CRN, NR transition) that
    /// requires operations the distribution's chosen [`crate::distribution::Space`]
    /// does not support.
    #[error("distribution mismatch for clock {clock}: {reason}")]
    DistributionMismatch { clock: String, reason: String },

    /// A root-find for a putative time, or a quantile inversion, failed to
    /// converge. Carries the clock key and distribution identity so a
    /// caller can report which clock needs a different inversion method.
    #[error("numeric failure for clock {clock} ({distribution}): {detail}")]
    NumericFailure {
        clock: String,
        distribution: String,
        detail: String,
    },
}

impl GsmpError {
    pub(crate) fn precondition(detail: impl Into<String>) -> Self {
        Self::PreconditionViolation {
            detail: detail.into(),
        }
    }

    pub(crate) fn mismatch(clock: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DistributionMismatch {
            clock: clock.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn numeric(
        clock: impl Into<String>,
        distribution: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::NumericFailure {
            clock: clock.into(),
            distribution: distribution.into(),
            detail: detail.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type GsmpResult<T> = Result<T, GsmpError>;
