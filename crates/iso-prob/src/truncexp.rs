//! Truncated-exponential decay-time spectrum.

use iso_core::{Error, Result};

use crate::spectrum::Spectrum;

/// Exponential spectrum truncated to `[0, max_t]`:
/// `f(t) = norm·exp(−t/lifetime)` with
/// `norm = 1 / [lifetime·(1 − exp(−max_t/lifetime))]`.
///
/// Immutable; [`TruncatedExponential::with_lifetime`] and
/// [`TruncatedExponential::with_max_t`] construct new values so the
/// normalization is always consistent with both parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TruncatedExponential {
    lifetime: f64,
    max_t: f64,
    norm: f64,
}

impl TruncatedExponential {
    /// Create a truncated-exponential spectrum.
    ///
    /// Fails with `InvalidParameter` if `lifetime` or `max_t` is
    /// non-positive or non-finite.
    pub fn new(lifetime: f64, max_t: f64) -> Result<Self> {
        if !lifetime.is_finite() || lifetime <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "lifetime must be finite and > 0, got {lifetime}"
            )));
        }
        if !max_t.is_finite() || max_t <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "maxT must be finite and > 0, got {max_t}"
            )));
        }
        let norm = 1.0 / (lifetime * (1.0 - (-max_t / lifetime).exp()));
        Ok(Self { lifetime, max_t, norm })
    }

    /// Build a new spectrum with a different lifetime.
    pub fn with_lifetime(&self, lifetime: f64) -> Result<Self> {
        Self::new(lifetime, self.max_t)
    }

    /// Build a new spectrum with a different truncation time.
    pub fn with_max_t(&self, max_t: f64) -> Result<Self> {
        Self::new(self.lifetime, max_t)
    }

    /// Decay lifetime.
    pub fn lifetime(&self) -> f64 {
        self.lifetime
    }

    /// Truncation time.
    pub fn max_t(&self) -> f64 {
        self.max_t
    }
}

impl Spectrum for TruncatedExponential {
    fn support(&self) -> (f64, f64) {
        (0.0, self.max_t)
    }

    fn density(&self, t: f64) -> f64 {
        if t < 0.0 || t > self.max_t {
            return 0.0;
        }
        self.norm * (-t / self.lifetime).exp()
    }

    /// `F(t) = (1 − exp(−t/lifetime)) / (1 − exp(−max_t/lifetime))`.
    fn cumulative(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= self.max_t {
            return 1.0;
        }
        self.norm * self.lifetime * (1.0 - (-t / self.lifetime).exp())
    }

    /// Closed-form inverse:
    /// `q(p) = −lifetime·ln(1 − p·(1 − exp(−max_t/lifetime)))`.
    fn quantile(&self, p: f64) -> f64 {
        if p <= 0.0 {
            return 0.0;
        }
        if p >= 1.0 {
            return self.max_t;
        }
        let tail = 1.0 - (-self.max_t / self.lifetime).exp();
        -self.lifetime * (1.0 - p * tail).ln()
    }
}
