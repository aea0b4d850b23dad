//! Common result types for the isofit workspace.

use serde::{Deserialize, Serialize};

/// Result of a chi-square yield fit.
///
/// Immutable once produced. `covariance` is the 2×2 matrix over the two
/// population yields, stored row-major.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chi2FitResult {
    /// Best-fit yields, one per population.
    pub yields: Vec<f64>,

    /// Covariance matrix (row-major, N×N) from the curvature at the minimum.
    pub covariance: Vec<f64>,

    /// Minimized chi-square statistic.
    pub chi2: f64,

    /// Degrees of freedom: number of bins minus number of free yields.
    pub ndof: usize,

    /// Upper-tail probability of `chi2` at `ndof` (survival function).
    pub p_value: f64,

    /// Convergence status reported by the minimizer.
    pub converged: bool,

    /// Number of objective evaluations.
    pub n_evaluations: usize,
}

impl Chi2FitResult {
    /// Covariance element (i, j). Returns `None` out of range.
    pub fn covariance_at(&self, i: usize, j: usize) -> Option<f64> {
        let n = self.yields.len();
        if i >= n || j >= n {
            return None;
        }
        Some(self.covariance[i * n + j])
    }

    /// Correlation coefficient between yields `i` and `j`.
    ///
    /// Returns `None` if either variance is non-positive.
    pub fn correlation(&self, i: usize, j: usize) -> Option<f64> {
        let vii = self.covariance_at(i, i)?;
        let vjj = self.covariance_at(j, j)?;
        if vii <= 0.0 || vjj <= 0.0 {
            return None;
        }
        Some(self.covariance_at(i, j)? / (vii * vjj).sqrt())
    }
}

/// Result of a Poisson maximum-likelihood yield fit.
///
/// Carries no covariance: uncertainty from the likelihood surface is out of
/// scope for this study.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlFitResult {
    /// Best-fit yields, one per population.
    pub yields: Vec<f64>,

    /// Minimized negative log-likelihood.
    pub fcn_min: f64,

    /// Convergence status reported by the minimizer.
    pub converged: bool,

    /// Number of objective evaluations.
    pub n_evaluations: usize,
}
