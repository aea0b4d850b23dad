//! Probability building blocks for the isofit toy study.
//!
//! This crate hosts the custom decay spectra and the probability math the
//! fit engine consumes:
//! - the [`Spectrum`] trait (density/cumulative/quantile/sample)
//! - concrete spectra ([`Parabolic`], [`TruncatedExponential`])
//! - the bin-fraction calculator ([`bin_fractions`])
//! - chi-square p-value helpers ([`pvalue`])

pub mod binning;
pub mod parabolic;
pub mod pvalue;
pub mod spectrum;
pub mod truncexp;

pub use binning::{bin_fractions, BinFractions};
pub use parabolic::Parabolic;
pub use spectrum::Spectrum;
pub use truncexp::TruncatedExponential;
