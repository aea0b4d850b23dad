//! Poisson maximum-likelihood yield estimator.

use iso_core::{Error, MlFitResult, Result};
use statrs::function::gamma::ln_gamma;

use crate::model::MixtureModel;
use crate::optimizer::{BoundedLbfgs, Objective, OptimizerConfig};

const YIELD_BOUNDS: (f64, f64) = (0.0, 1e12);

/// Floor on predicted counts inside the log; a zero prediction against a
/// non-zero observation would otherwise send the NLL to infinity and stall
/// the line search.
const PRED_FLOOR: f64 = 1e-10;

struct PoissonNll<'a> {
    observed: &'a [f64],
    model: &'a MixtureModel,
}

impl Objective for PoissonNll<'_> {
    /// `Σ_j [pred_j − obs_j·ln(pred_j) + ln Γ(obs_j + 1)]`
    fn value(&self, yields: &[f64]) -> Result<f64> {
        let pred = self.model.predicted(yields)?;
        let mut nll = 0.0;
        for (&obs, &p) in self.observed.iter().zip(&pred) {
            let lam = p.max(PRED_FLOOR);
            nll += lam - obs * lam.ln() + ln_gamma(obs + 1.0);
        }
        Ok(nll)
    }
}

/// Poisson-likelihood maximization over the population yields.
///
/// Minimizes the negative log-likelihood of independent Poisson bin counts.
/// Reports only the yields and the minimized NLL; covariance from the
/// likelihood surface is out of scope for this study.
pub struct LikelihoodEstimator {
    config: OptimizerConfig,
}

impl LikelihoodEstimator {
    /// Create an estimator with the default minimizer configuration.
    pub fn new() -> Self {
        Self { config: OptimizerConfig::default() }
    }

    /// Override the minimizer configuration.
    pub fn with_config(mut self, config: OptimizerConfig) -> Self {
        self.config = config;
        self
    }

    /// Fit the yields to `observed` bin counts.
    pub fn fit(
        &self,
        observed: &[f64],
        model: &MixtureModel,
        init_yields: &[f64],
    ) -> Result<MlFitResult> {
        if observed.len() != model.n_bins() {
            return Err(Error::DimensionMismatch(format!(
                "observed bins ({}) != model bins ({})",
                observed.len(),
                model.n_bins()
            )));
        }

        let objective = PoissonNll { observed, model };
        let bounds = vec![YIELD_BOUNDS; model.n_populations()];
        let minimum =
            BoundedLbfgs::new(self.config.clone()).minimize(&objective, init_yields, &bounds)?;
        if !minimum.converged {
            return Err(Error::FitNonConvergence(format!(
                "likelihood minimizer stopped without converging: {}",
                minimum.message
            )));
        }

        Ok(MlFitResult {
            yields: minimum.parameters,
            fcn_min: minimum.fval,
            converged: minimum.converged,
            n_evaluations: minimum.n_fev,
        })
    }
}

impl Default for LikelihoodEstimator {
    fn default() -> Self {
        Self::new()
    }
}
