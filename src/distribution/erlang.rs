use super::{Distribution, Space, bisect_invccdf};
use crate::rng::RngCore;

/// Erlang(shape `k`, rate `lambda`): a sum of `k` i.i.d. Exponential(lambda)
/// variates, i.e. Gamma with integer shape.
///
/// The survival function has a closed form (a partial sum of Poisson
/// terms) but no closed-form inverse; [`invccdf`](Distribution::invccdf)
/// falls back to bisection on that closed form. Still grouped with the
/// log-space carriers since the cumulative hazard `-logccdf(t)` is exact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Erlang {
    shape: u32,
    rate: f64,
}

impl Erlang {
    pub fn new(shape: u32, rate: f64) -> Self {
        assert!(shape >= 1, "erlang shape must be >= 1");
        assert!(rate > 0.0, "erlang rate must be positive");
        Self { shape, rate }
    }

    /// `ln((k-1)!)` via direct summation — shapes used in GSMP models are
    /// small enough (single digits to low tens) that `lgamma` precision
    /// isn't worth an extra dependency.
    fn ln_factorial(n: u32) -> f64 {
        (1..=n).map(|i| (i as f64).ln()).sum()
    }
}

impl Distribution for Erlang {
    fn sample(&self, rng: &mut dyn RngCore) -> f64 {
        (0..self.shape).map(|_| rng.exponential1()).sum::<f64>() / self.rate
    }

    fn logpdf(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return f64::NEG_INFINITY;
        }
        let k = self.shape as f64;
        k * self.rate.ln() + (k - 1.0) * t.ln() - self.rate * t
            - Self::ln_factorial(self.shape - 1)
    }

    fn logccdf(&self, t: f64) -> f64 {
        self.ccdf(t).ln()
    }

    fn ccdf(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 1.0;
        }
        let x = self.rate * t;
        let mut term = (-x).exp();
        let mut sum = term;
        for i in 1..self.shape {
            term *= x / i as f64;
            sum += term;
        }
        sum
    }

    fn invccdf(&self, q: f64) -> f64 {
        bisect_invccdf(|t| self.ccdf(t), q)
    }

    fn rate(&self) -> Option<f64> {
        (self.shape == 1).then_some(self.rate)
    }

    fn space(&self) -> Space {
        Space::Log
    }

    fn boxed_clone(&self) -> Box<dyn Distribution> {
        Box::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SmallRngHandle;

    #[test]
    fn shape_one_matches_exponential() {
        let erlang = Erlang::new(1, 3.0);
        let exponential = super::super::Exponential::new(3.0);
        for t in [0.0, 0.3, 1.5] {
            assert!((erlang.ccdf(t) - exponential.ccdf(t)).abs() < 1e-12);
        }
    }

    #[test]
    fn invccdf_roundtrips_ccdf() {
        let dist = Erlang::new(4, 1.5);
        for q in [0.05, 0.3, 0.6, 0.9] {
            let t = dist.invccdf(q);
            assert!((dist.ccdf(t) - q).abs() < 1e-6);
        }
    }

    #[test]
    fn mean_matches_shape_over_rate() {
        let dist = Erlang::new(3, 2.0); // mean = 1.5
        let mut rng = SmallRngHandle::seeded(3);
        let n = 200_000;
        let mean = (0..n).map(|_| dist.sample(&mut rng)).sum::<f64>() / n as f64;
        assert!((mean - 1.5).abs() < 0.02, "mean was {mean}");
    }
}
