//! Generation, binning, and yield fitting for the isofit toy study.
//!
//! The pipeline: spectra ([`iso_prob`]) → event generation
//! ([`experiment`]) → histograms ([`histogram`]) → yield fits ([`chi2`],
//! [`likelihood`]) → repeated-experiment aggregation ([`study`]).

pub mod chi2;
pub mod experiment;
pub mod histogram;
pub mod likelihood;
pub mod model;
pub mod optimizer;
pub mod study;
pub mod table;

pub use chi2::{Chi2Estimator, ErrorModel};
pub use experiment::{throw_experiment, ExperimentData};
pub use histogram::{Histogram1d, Histogram2d};
pub use likelihood::LikelihoodEstimator;
pub use model::MixtureModel;
pub use optimizer::{BoundedLbfgs, Minimum, Objective, OptimizerConfig};
pub use study::{StudyConfig, ToyStudy};
pub use table::ExperimentRow;
