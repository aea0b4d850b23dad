//! Bounded L-BFGS minimization on top of argmin.
//!
//! Both yield estimators share this wrapper: box bounds are enforced by
//! clamping with a projected-gradient guard, and gradients default to
//! central differences so objectives only have to provide a value.

use argmin::core::{CostFunction, Executor, Gradient, State, TerminationReason, TerminationStatus};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use iso_core::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Minimizer configuration.
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Maximum iterations.
    pub max_iter: u64,
    /// Gradient-norm convergence tolerance.
    pub tol: f64,
    /// Number of L-BFGS correction pairs.
    pub memory: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self { max_iter: 500, tol: 1e-8, memory: 10 }
    }
}

/// Outcome of one minimization.
#[derive(Debug, Clone)]
pub struct Minimum {
    /// Best parameters found (clamped into bounds).
    pub parameters: Vec<f64>,
    /// Objective value at the minimum.
    pub fval: f64,
    /// Iterations used.
    pub n_iter: u64,
    /// Objective evaluations.
    pub n_fev: usize,
    /// Whether the solver reported convergence.
    pub converged: bool,
    /// Termination message from the solver.
    pub message: String,
}

/// A scalar objective over a parameter vector.
pub trait Objective: Send + Sync {
    /// Objective value at `params`.
    fn value(&self, params: &[f64]) -> Result<f64>;

    /// Gradient at `params`; defaults to central differences with a step
    /// scaled to the parameter magnitude.
    fn gradient(&self, params: &[f64]) -> Result<Vec<f64>> {
        let mut grad = vec![0.0; params.len()];
        let mut probe = params.to_vec();
        for i in 0..params.len() {
            let eps = 1e-6 * params[i].abs().max(1.0);
            probe[i] = params[i] + eps;
            let f_plus = self.value(&probe)?;
            probe[i] = params[i] - eps;
            let f_minus = self.value(&probe)?;
            probe[i] = params[i];
            grad[i] = (f_plus - f_minus) / (2.0 * eps);
        }
        Ok(grad)
    }
}

fn clamp(params: &[f64], bounds: &[(f64, f64)]) -> Vec<f64> {
    params.iter().zip(bounds).map(|(&v, &(lo, hi))| v.clamp(lo, hi)).collect()
}

struct BoundedProblem<'a> {
    objective: &'a dyn Objective,
    bounds: &'a [(f64, f64)],
    n_fev: Arc<AtomicUsize>,
}

impl CostFunction for BoundedProblem<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, params: &Self::Param) -> std::result::Result<f64, argmin::core::Error> {
        self.n_fev.fetch_add(1, Ordering::Relaxed);
        let clamped = clamp(params, self.bounds);
        self.objective.value(&clamped).map_err(|e| argmin::core::Error::msg(e.to_string()))
    }
}

impl Gradient for BoundedProblem<'_> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, params: &Self::Param) -> std::result::Result<Vec<f64>, argmin::core::Error> {
        let clamped = clamp(params, self.bounds);
        let mut g = self
            .objective
            .gradient(&clamped)
            .map_err(|e| argmin::core::Error::msg(e.to_string()))?;

        // At an active bound, zero any gradient component that points
        // further outside; otherwise the line search keeps stepping into
        // the flat clamped region and never terminates.
        const EPS: f64 = 1e-12;
        for (gi, (&x, &(lo, hi))) in g.iter_mut().zip(clamped.iter().zip(self.bounds)) {
            if (x <= lo + EPS && *gi > 0.0) || (x >= hi - EPS && *gi < 0.0) {
                *gi = 0.0;
            }
        }
        Ok(g)
    }
}

/// Box-bounded L-BFGS minimizer.
pub struct BoundedLbfgs {
    config: OptimizerConfig,
}

impl BoundedLbfgs {
    /// Create a minimizer with the given configuration.
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// Minimize `objective` from `init` subject to per-parameter bounds.
    ///
    /// `init` and `bounds` must align; the starting point is clamped into
    /// the box before the first evaluation.
    pub fn minimize(
        &self,
        objective: &dyn Objective,
        init: &[f64],
        bounds: &[(f64, f64)],
    ) -> Result<Minimum> {
        if init.len() != bounds.len() {
            return Err(Error::DimensionMismatch(format!(
                "init ({}) and bounds ({}) must align",
                init.len(),
                bounds.len()
            )));
        }

        let n_fev = Arc::new(AtomicUsize::new(0));
        let problem =
            BoundedProblem { objective, bounds, n_fev: n_fev.clone() };

        let linesearch = MoreThuenteLineSearch::new();
        let solver = LBFGS::new(linesearch, self.config.memory)
            .with_tolerance_grad(self.config.tol)
            .and_then(|s| s.with_tolerance_cost((0.1 * self.config.tol).max(1e-14)))
            .map_err(|e| Error::Computation(format!("invalid optimizer tolerance: {e}")))?;

        let res = Executor::new(problem, solver)
            .configure(|state| state.param(clamp(init, bounds)).max_iters(self.config.max_iter))
            .run()
            // A line-search breakdown is a per-fit numerical failure, not a
            // caller error; classify it so the study loop can record it.
            .map_err(|e| Error::FitNonConvergence(format!("minimization failed: {e}")))?;

        let state = res.state();
        let best = state
            .get_best_param()
            .ok_or_else(|| Error::Computation("minimizer produced no parameters".into()))?;
        let termination = state.get_termination_status();
        let converged = matches!(
            termination,
            TerminationStatus::Terminated(TerminationReason::SolverConverged)
                | TerminationStatus::Terminated(TerminationReason::TargetCostReached)
        );

        Ok(Minimum {
            parameters: clamp(best, bounds),
            fval: state.get_best_cost(),
            n_iter: state.get_iter(),
            n_fev: n_fev.load(Ordering::Relaxed),
            converged,
            message: termination.to_string(),
        })
    }
}

impl Default for BoundedLbfgs {
    fn default() -> Self {
        Self::new(OptimizerConfig::default())
    }
}
