//! Parabolic energy spectrum.

use iso_core::{Error, Result};

use crate::spectrum::{bisect_quantile, Spectrum};

/// Parabolic spectrum `f(x) = (6/endpoint³)·x·(endpoint − x)` on
/// `[0, endpoint]`.
///
/// The normalization constant `6/endpoint³` is exact, so the density
/// integrates to 1 by construction. The value is immutable: to change the
/// endpoint, build a new spectrum with [`Parabolic::with_endpoint`] — the
/// domain bound and normalization can never go stale relative to the
/// parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parabolic {
    endpoint: f64,
    norm: f64,
}

impl Parabolic {
    /// Create a parabolic spectrum with the given endpoint (e.g. in MeV).
    ///
    /// Fails with `InvalidParameter` for non-positive or non-finite
    /// endpoints; no silent clamping.
    pub fn new(endpoint: f64) -> Result<Self> {
        if !endpoint.is_finite() || endpoint <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "endpoint must be finite and > 0, got {endpoint}"
            )));
        }
        Ok(Self { endpoint, norm: 6.0 / endpoint.powi(3) })
    }

    /// Build a new spectrum with a different endpoint.
    pub fn with_endpoint(&self, endpoint: f64) -> Result<Self> {
        Self::new(endpoint)
    }

    /// Spectrum endpoint.
    pub fn endpoint(&self) -> f64 {
        self.endpoint
    }
}

impl Spectrum for Parabolic {
    fn support(&self) -> (f64, f64) {
        (0.0, self.endpoint)
    }

    fn density(&self, x: f64) -> f64 {
        if x < 0.0 || x > self.endpoint {
            return 0.0;
        }
        self.norm * x * (self.endpoint - x)
    }

    /// `F(x) = x²·(3·endpoint − 2x) / endpoint³`.
    fn cumulative(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        if x >= self.endpoint {
            return 1.0;
        }
        x * x * (3.0 * self.endpoint - 2.0 * x) / self.endpoint.powi(3)
    }

    fn quantile(&self, p: f64) -> f64 {
        if p <= 0.0 {
            return 0.0;
        }
        if p >= 1.0 {
            return self.endpoint;
        }
        // The cubic CDF has no tidy closed-form inverse; bisection on the
        // monotone CDF is exact to f64 resolution.
        bisect_quantile(|x| self.cumulative(x), 0.0, self.endpoint, p)
    }
}
