//! Weighted least-squares (chi-square) yield estimator.

use iso_core::{Chi2FitResult, Error, Result};
use iso_prob::pvalue::chi2_pvalue;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::model::MixtureModel;
use crate::optimizer::{BoundedLbfgs, Objective, OptimizerConfig};

/// Yield bounds handed to the minimizer: yields are counts, never negative.
const YIELD_BOUNDS: (f64, f64) = (0.0, 1e12);

/// Variance floor keeping the weights finite; with the minimum-bin-population
/// precondition in force this never binds in practice.
const VAR_FLOOR: f64 = 1e-9;

/// Which variance estimate weights the residuals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorModel {
    /// Model-predicted variance: `var_j = pred_j`.
    Pearson,
    /// Observed-count variance: `var_j = obs_j`.
    Neyman,
}

struct Chi2Objective<'a> {
    observed: &'a [f64],
    model: &'a MixtureModel,
    error_model: ErrorModel,
}

impl Objective for Chi2Objective<'_> {
    fn value(&self, yields: &[f64]) -> Result<f64> {
        let pred = self.model.predicted(yields)?;
        let mut chi2 = 0.0;
        for (&obs, &p) in self.observed.iter().zip(&pred) {
            let var = match self.error_model {
                ErrorModel::Pearson => p,
                ErrorModel::Neyman => obs,
            }
            .max(VAR_FLOOR);
            let r = obs - p;
            chi2 += r * r / var;
        }
        Ok(chi2)
    }
}

/// Chi-square minimization over the two population yields.
pub struct Chi2Estimator {
    config: OptimizerConfig,
    error_model: ErrorModel,
}

impl Chi2Estimator {
    /// Create an estimator with the given error treatment.
    pub fn new(error_model: ErrorModel) -> Self {
        Self { config: OptimizerConfig::default(), error_model }
    }

    /// Override the minimizer configuration.
    pub fn with_config(mut self, config: OptimizerConfig) -> Self {
        self.config = config;
        self
    }

    /// Fit the yields to `observed` bin counts.
    ///
    /// Returns the best-fit yields, their covariance from the curvature at
    /// the minimum, the minimized chi-square, `ndof = nbins − nyields`, and
    /// the survival-function p-value. Non-convergence surfaces as
    /// `FitNonConvergence` so the caller decides whether to abort or record
    /// a sentinel row.
    pub fn fit(
        &self,
        observed: &[f64],
        model: &MixtureModel,
        init_yields: &[f64],
    ) -> Result<Chi2FitResult> {
        let n_params = model.n_populations();
        if observed.len() != model.n_bins() {
            return Err(Error::DimensionMismatch(format!(
                "observed bins ({}) != model bins ({})",
                observed.len(),
                model.n_bins()
            )));
        }
        if model.n_bins() <= n_params {
            return Err(Error::DimensionMismatch(format!(
                "{} bins cannot constrain {} free yields",
                model.n_bins(),
                n_params
            )));
        }

        let objective = Chi2Objective { observed, model, error_model: self.error_model };
        let bounds = vec![YIELD_BOUNDS; n_params];
        let minimum =
            BoundedLbfgs::new(self.config.clone()).minimize(&objective, init_yields, &bounds)?;
        if !minimum.converged {
            return Err(Error::FitNonConvergence(format!(
                "chi-square minimizer stopped without converging: {}",
                minimum.message
            )));
        }

        let ndof = model.n_bins() - n_params;
        let p_value = chi2_pvalue(minimum.fval.max(0.0), ndof as f64)?;
        // chi² ≈ chi²_min + Δy'·H·Δy/1 near the minimum, with H the half
        // curvature; the yield covariance is 2·H⁻¹ for a chi-square objective.
        let hessian = curvature(&objective, &minimum.parameters)?;
        let covariance = invert_curvature(&(hessian * 0.5))?;

        Ok(Chi2FitResult {
            yields: minimum.parameters,
            covariance: covariance.iter().copied().collect(),
            chi2: minimum.fval,
            ndof,
            p_value,
            converged: minimum.converged,
            n_evaluations: minimum.n_fev,
        })
    }
}

/// Symmetrized forward-difference Hessian of the objective at `params`.
pub(crate) fn curvature(objective: &dyn Objective, params: &[f64]) -> Result<DMatrix<f64>> {
    let n = params.len();
    let grad_center = objective.gradient(params)?;
    let mut hessian = DMatrix::zeros(n, n);
    for j in 0..n {
        let eps = 1e-4 * params[j].abs().max(1.0);
        let mut shifted = params.to_vec();
        shifted[j] += eps;
        let grad_plus = objective.gradient(&shifted)?;
        for i in 0..n {
            hessian[(i, j)] = (grad_plus[i] - grad_center[i]) / eps;
        }
    }
    let ht = hessian.transpose();
    Ok((&hessian + &ht) * 0.5)
}

/// Invert a curvature matrix to a covariance, preferring a damped Cholesky
/// solve so a slightly indefinite numerical Hessian does not yield negative
/// variances; falls back to LU.
pub(crate) fn invert_curvature(curv: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let n = curv.nrows();
    let identity = DMatrix::identity(n, n);
    let diag_scale =
        (0..n).map(|i| curv[(i, i)].abs()).fold(0.0_f64, f64::max).max(1.0);

    let mut damped = curv.clone();
    let mut damping = 0.0_f64;
    for attempt in 0..8 {
        if let Some(chol) = nalgebra::linalg::Cholesky::new(damped.clone()) {
            return Ok(chol.solve(&identity));
        }
        if attempt == 7 {
            break;
        }
        let next = if damping == 0.0 { diag_scale * 1e-9 } else { damping * 10.0 };
        for i in 0..n {
            damped[(i, i)] += next - damping;
        }
        damping = next;
    }

    let cov = damped
        .lu()
        .try_inverse()
        .ok_or_else(|| Error::Computation("curvature matrix is singular".into()))?;
    for i in 0..n {
        let v = cov[(i, i)];
        if !(v.is_finite() && v > 0.0) {
            return Err(Error::Computation(format!("non-positive variance {v} for yield {i}")));
        }
    }
    Ok(cov)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use iso_prob::{bin_fractions, Parabolic, TruncatedExponential};

    fn scenario_model_1d() -> MixtureModel {
        let e0 = Parabolic::new(12.0).unwrap();
        let e1 = Parabolic::new(8.0).unwrap();
        let t0 = TruncatedExponential::new(260.0, 260.0).unwrap();
        let t1 = TruncatedExponential::new(170.0, 260.0).unwrap();
        let energy = vec![
            bin_fractions(&e0, 4, (0.0, 12.0)).unwrap(),
            bin_fractions(&e1, 4, (0.0, 12.0)).unwrap(),
        ];
        let time = vec![
            bin_fractions(&t0, 4, (0.0, 260.0)).unwrap(),
            bin_fractions(&t1, 4, (0.0, 260.0)).unwrap(),
        ];
        MixtureModel::concat_1d(&energy, &time).unwrap()
    }

    #[test]
    fn test_zero_noise_recovers_true_yields() {
        let model = scenario_model_1d();
        let truth = [1000.0, 100.0];
        let observed = model.predicted(&truth).unwrap();

        for error_model in [ErrorModel::Pearson, ErrorModel::Neyman] {
            let fit = Chi2Estimator::new(error_model)
                .fit(&observed, &model, &[800.0, 150.0])
                .unwrap();
            assert!(fit.converged);
            assert_relative_eq!(fit.yields[0], 1000.0, epsilon = 1e-2);
            assert_relative_eq!(fit.yields[1], 100.0, epsilon = 1e-2);
            assert!(fit.chi2 < 1e-6, "chi2 = {}", fit.chi2);
            assert_eq!(fit.ndof, 6);
            assert_relative_eq!(fit.p_value, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_covariance_is_symmetric_positive() {
        let model = scenario_model_1d();
        let observed = model.predicted(&[1000.0, 100.0]).unwrap();
        let fit = Chi2Estimator::new(ErrorModel::Pearson)
            .fit(&observed, &model, &[1000.0, 100.0])
            .unwrap();
        let v00 = fit.covariance_at(0, 0).unwrap();
        let v11 = fit.covariance_at(1, 1).unwrap();
        let v01 = fit.covariance_at(0, 1).unwrap();
        let v10 = fit.covariance_at(1, 0).unwrap();
        assert!(v00 > 0.0 && v11 > 0.0);
        assert_relative_eq!(v01, v10, epsilon = 1e-9);
        // Statistical scale: variance of a ~1000-event yield is O(1000).
        assert!(v00 > 100.0 && v00 < 1e5);
    }

    #[test]
    fn test_observed_length_must_match() {
        let model = scenario_model_1d();
        let fit = Chi2Estimator::new(ErrorModel::Pearson).fit(&[1.0; 5], &model, &[1.0, 1.0]);
        assert!(fit.is_err());
    }
}
