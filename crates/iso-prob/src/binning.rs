//! Expected bin-fraction vectors.

use iso_core::{Error, Result};

use crate::spectrum::Spectrum;

/// Tolerance on `sum(fractions) - 1` before a diagnostic is emitted.
pub const NORMALIZATION_TOL: f64 = 1e-6;

/// The expected probability mass of a spectrum in each of `nbins`
/// equal-width bins over a range.
///
/// Entries are non-negative and sum to 1 when the range covers the
/// spectrum's support; a narrower range leaves mass outside and the sum
/// falls short. [`BinFractions::is_normalized`] exposes that check as a
/// queryable result instead of only a console message.
#[derive(Debug, Clone, PartialEq)]
pub struct BinFractions {
    fractions: Vec<f64>,
    sum: f64,
}

impl BinFractions {
    /// Fraction entries, one per bin.
    pub fn fractions(&self) -> &[f64] {
        &self.fractions
    }

    /// Number of bins.
    pub fn len(&self) -> usize {
        self.fractions.len()
    }

    /// True if there are no bins (never the case for a constructed value).
    pub fn is_empty(&self) -> bool {
        self.fractions.is_empty()
    }

    /// Sum of all entries.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Whether the entries sum to 1 within `tol`.
    pub fn is_normalized(&self, tol: f64) -> bool {
        (self.sum - 1.0).abs() <= tol
    }
}

/// Compute the expected fraction of probability mass in each of `nbins`
/// equal-width bins over `(lo, hi)`.
///
/// Entry `i` is `F(lo + (i+1)·w) − F(lo + i·w)` with `w = (hi−lo)/nbins`.
/// Fails with `InvalidRange` for `nbins == 0` or a degenerate/non-finite
/// range. A sum deviating from 1 by more than [`NORMALIZATION_TOL`] logs a
/// warning but does not fail (callers decide via `is_normalized`).
pub fn bin_fractions(spectrum: &dyn Spectrum, nbins: usize, range: (f64, f64)) -> Result<BinFractions> {
    let (lo, hi) = range;
    if nbins == 0 {
        return Err(Error::InvalidRange("nbins must be >= 1".into()));
    }
    if !lo.is_finite() || !hi.is_finite() || hi <= lo {
        return Err(Error::InvalidRange(format!(
            "bin range must satisfy lo < hi with finite bounds, got ({lo}, {hi})"
        )));
    }

    let width = (hi - lo) / nbins as f64;
    let mut fractions = Vec::with_capacity(nbins);
    let mut prev = spectrum.cumulative(lo);
    for i in 1..=nbins {
        let upper = spectrum.cumulative(lo + i as f64 * width);
        fractions.push(upper - prev);
        prev = upper;
    }

    let sum: f64 = fractions.iter().sum();
    if (sum - 1.0).abs() > NORMALIZATION_TOL {
        log::warn!(
            "bin fractions over ({lo}, {hi}) with {nbins} bins sum to {sum}, not 1; \
             range does not cover the spectrum support"
        );
    }

    Ok(BinFractions { fractions, sum })
}
