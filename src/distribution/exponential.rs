use super::{Distribution, Space};
use crate::rng::RngCore;

/// Constant-hazard distribution. `rate > 0`.
///
/// Memoryless: `sample_shifted` coincides with `sample` for any shift,
/// since `ccdf(a + b) = ccdf(a) * ccdf(b)` — but we don't special-case
/// this, the default [`Distribution::sample_shifted`] implementation
/// already reduces to it algebraically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exponential {
    rate: f64,
}

impl Exponential {
    pub fn new(rate: f64) -> Self {
        assert!(rate > 0.0, "exponential rate must be positive");
        Self { rate }
    }
}

impl Distribution for Exponential {
    fn sample(&self, rng: &mut dyn RngCore) -> f64 {
        rng.exponential1() / self.rate
    }

    fn logpdf(&self, t: f64) -> f64 {
        self.rate.ln() - self.rate * t
    }

    fn logccdf(&self, t: f64) -> f64 {
        -self.rate * t
    }

    fn ccdf(&self, t: f64) -> f64 {
        (-self.rate * t).exp()
    }

    fn invccdf(&self, q: f64) -> f64 {
        -q.ln() / self.rate
    }

    fn rate(&self) -> Option<f64> {
        Some(self.rate)
    }

    fn space(&self) -> Space {
        Space::Log
    }

    fn boxed_clone(&self) -> Box<dyn Distribution> {
        Box::new(*self)
    }
}
