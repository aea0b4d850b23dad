//! The `Spectrum` trait: a small capability set for continuous spectra.
//!
//! Concrete spectra implement density, CDF, and quantile with closed-form
//! (or closed-form plus bisection) expressions; sampling comes for free via
//! inverse-CDF transform of uniform draws. This replaces the "subclass a
//! generic continuous-distribution base" pattern: no generic numerical
//! inversion is ever involved unless a spectrum opts into it.

use rand::rngs::StdRng;
use rand::Rng;

/// A normalized continuous spectrum on a finite support `[lo, hi]`.
///
/// Invariants every implementation upholds:
/// - `density` integrates to 1 over `support()` and is 0 outside it;
/// - `cumulative` is monotone non-decreasing with `cumulative(lo) = 0`
///   and `cumulative(hi) = 1`;
/// - `quantile(cumulative(x)) == x` for `x` in the support (up to the
///   implementation's inversion tolerance).
pub trait Spectrum: Send + Sync {
    /// Support `(lo, hi)` of the spectrum.
    fn support(&self) -> (f64, f64);

    /// Probability density at `x` (0 outside the support).
    fn density(&self, x: f64) -> f64;

    /// Cumulative probability at `x`, clamped to `[0, 1]` outside the support.
    fn cumulative(&self, x: f64) -> f64;

    /// Inverse CDF: the `x` with `cumulative(x) = p`, for `p` in `[0, 1]`.
    fn quantile(&self, p: f64) -> f64;

    /// Draw `n` independent samples by inverse-CDF transform.
    ///
    /// `n == 0` returns an empty vector. Determinism is entirely governed by
    /// the caller-provided generator.
    fn sample(&self, n: usize, rng: &mut StdRng) -> Vec<f64> {
        (0..n).map(|_| self.quantile(rng.random::<f64>())).collect()
    }
}

/// Invert a monotone CDF by bisection on `[lo, hi]`.
///
/// Used by spectra whose CDF has no convenient closed-form inverse. The
/// bracket always contains the root since `cdf(lo) <= p <= cdf(hi)`.
pub(crate) fn bisect_quantile<F: Fn(f64) -> f64>(cdf: F, lo: f64, hi: f64, p: f64) -> f64 {
    let (mut a, mut b) = (lo, hi);
    // 64 halvings take the bracket well below f64 resolution on any
    // physically sensible support.
    for _ in 0..64 {
        let mid = 0.5 * (a + b);
        if cdf(mid) < p {
            a = mid;
        } else {
            b = mid;
        }
        if b - a <= f64::EPSILON * hi.abs().max(1.0) {
            break;
        }
    }
    0.5 * (a + b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bisect_linear_cdf() {
        // cdf(x) = x on [0, 1]: quantile is the identity.
        let q = bisect_quantile(|x| x, 0.0, 1.0, 0.37);
        assert!((q - 0.37).abs() < 1e-12);
    }

    #[test]
    fn test_bisect_endpoints() {
        let q0 = bisect_quantile(|x| x, 0.0, 1.0, 0.0);
        let q1 = bisect_quantile(|x| x, 0.0, 1.0, 1.0);
        assert!(q0.abs() < 1e-12);
        assert!((q1 - 1.0).abs() < 1e-12);
    }
}
