//! Error types for the isofit workspace.

use thiserror::Error;

/// Workspace-wide error type.
///
/// All fatal variants are raised before any randomness is consumed or
/// partial output is written; `FitNonConvergence` is the one per-iteration
/// error and is recorded by the study loop rather than aborting the batch.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A distribution parameter is non-positive or non-finite.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A binning range is degenerate or a bin count is zero.
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// Positionally-aligned inputs have different lengths.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// An expected bin population falls below the configured minimum,
    /// invalidating the Gaussian approximation behind the chi-square fit.
    #[error("insufficient bin population: {0}")]
    InsufficientBinPopulation(String),

    /// The minimizer terminated without converging.
    #[error("fit did not converge: {0}")]
    FitNonConvergence(String),

    /// Numerical computation error
    #[error("computation error: {0}")]
    Computation(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
