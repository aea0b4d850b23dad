//! The per-experiment results row.

use iso_core::{Chi2FitResult, MlFitResult};
use serde::{Deserialize, Serialize};

/// One row of the experiment-results table: all four fit variants of one
/// fake experiment.
///
/// Field names serialize to the reference column schema. A failed fit
/// leaves NaN sentinels in its fields and a tag in `status`; `"ok"` means
/// every fit converged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentRow {
    #[serde(rename = "n0_1D")]
    pub n0_1d: f64,
    #[serde(rename = "n1_1D")]
    pub n1_1d: f64,
    #[serde(rename = "var00_1D")]
    pub var00_1d: f64,
    #[serde(rename = "var01_1D")]
    pub var01_1d: f64,
    #[serde(rename = "var11_1D")]
    pub var11_1d: f64,
    #[serde(rename = "chi_1D")]
    pub chi_1d: f64,
    #[serde(rename = "pval_1D")]
    pub pval_1d: f64,
    #[serde(rename = "n0_2D")]
    pub n0_2d: f64,
    #[serde(rename = "n1_2D")]
    pub n1_2d: f64,
    #[serde(rename = "var00_2D")]
    pub var00_2d: f64,
    #[serde(rename = "var01_2D")]
    pub var01_2d: f64,
    #[serde(rename = "var11_2D")]
    pub var11_2d: f64,
    #[serde(rename = "chi_2D")]
    pub chi_2d: f64,
    #[serde(rename = "pval_2D")]
    pub pval_2d: f64,
    #[serde(rename = "n0_1DML")]
    pub n0_1dml: f64,
    #[serde(rename = "n1_1DML")]
    pub n1_1dml: f64,
    #[serde(rename = "fncmin_1DML")]
    pub fncmin_1dml: f64,
    #[serde(rename = "n0_2DML")]
    pub n0_2dml: f64,
    #[serde(rename = "n1_2DML")]
    pub n1_2dml: f64,
    #[serde(rename = "fncmin_2DML")]
    pub fncmin_2dml: f64,
    pub status: String,
}

impl ExperimentRow {
    /// Assemble a row from the four per-experiment fit outcomes.
    ///
    /// `Err` outcomes (per-iteration fit failures) become NaN sentinels and
    /// a semicolon-joined tag list in `status`.
    pub fn from_fits(
        chi2_1d: Result<Chi2FitResult, iso_core::Error>,
        chi2_2d: Result<Chi2FitResult, iso_core::Error>,
        ml_1d: Result<MlFitResult, iso_core::Error>,
        ml_2d: Result<MlFitResult, iso_core::Error>,
    ) -> Self {
        let mut failed: Vec<&str> = Vec::new();
        let mut row = Self::all_nan();

        match chi2_1d {
            Ok(f) => {
                row.n0_1d = f.yields[0];
                row.n1_1d = f.yields[1];
                row.var00_1d = f.covariance_at(0, 0).unwrap_or(f64::NAN);
                row.var01_1d = f.covariance_at(0, 1).unwrap_or(f64::NAN);
                row.var11_1d = f.covariance_at(1, 1).unwrap_or(f64::NAN);
                row.chi_1d = f.chi2;
                row.pval_1d = f.p_value;
            }
            Err(_) => failed.push("chi2_1D"),
        }
        match chi2_2d {
            Ok(f) => {
                row.n0_2d = f.yields[0];
                row.n1_2d = f.yields[1];
                row.var00_2d = f.covariance_at(0, 0).unwrap_or(f64::NAN);
                row.var01_2d = f.covariance_at(0, 1).unwrap_or(f64::NAN);
                row.var11_2d = f.covariance_at(1, 1).unwrap_or(f64::NAN);
                row.chi_2d = f.chi2;
                row.pval_2d = f.p_value;
            }
            Err(_) => failed.push("chi2_2D"),
        }
        match ml_1d {
            Ok(f) => {
                row.n0_1dml = f.yields[0];
                row.n1_1dml = f.yields[1];
                row.fncmin_1dml = f.fcn_min;
            }
            Err(_) => failed.push("ml_1D"),
        }
        match ml_2d {
            Ok(f) => {
                row.n0_2dml = f.yields[0];
                row.n1_2dml = f.yields[1];
                row.fncmin_2dml = f.fcn_min;
            }
            Err(_) => failed.push("ml_2D"),
        }

        row.status = if failed.is_empty() { "ok".into() } else { failed.join(";") };
        row
    }

    fn all_nan() -> Self {
        Self {
            n0_1d: f64::NAN,
            n1_1d: f64::NAN,
            var00_1d: f64::NAN,
            var01_1d: f64::NAN,
            var11_1d: f64::NAN,
            chi_1d: f64::NAN,
            pval_1d: f64::NAN,
            n0_2d: f64::NAN,
            n1_2d: f64::NAN,
            var00_2d: f64::NAN,
            var01_2d: f64::NAN,
            var11_2d: f64::NAN,
            chi_2d: f64::NAN,
            pval_2d: f64::NAN,
            n0_1dml: f64::NAN,
            n1_1dml: f64::NAN,
            fncmin_1dml: f64::NAN,
            n0_2dml: f64::NAN,
            n1_2dml: f64::NAN,
            fncmin_2dml: f64::NAN,
            status: String::new(),
        }
    }

    /// Whether every numeric field is finite.
    pub fn is_finite(&self) -> bool {
        [
            self.n0_1d,
            self.n1_1d,
            self.var00_1d,
            self.var01_1d,
            self.var11_1d,
            self.chi_1d,
            self.pval_1d,
            self.n0_2d,
            self.n1_2d,
            self.var00_2d,
            self.var01_2d,
            self.var11_2d,
            self.chi_2d,
            self.pval_2d,
            self.n0_1dml,
            self.n1_1dml,
            self.fncmin_1dml,
            self.n0_2dml,
            self.n1_2dml,
            self.fncmin_2dml,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iso_core::Error;

    fn chi2_fit() -> Chi2FitResult {
        Chi2FitResult {
            yields: vec![990.0, 110.0],
            covariance: vec![1000.0, -40.0, -40.0, 110.0],
            chi2: 5.5,
            ndof: 6,
            p_value: 0.48,
            converged: true,
            n_evaluations: 30,
        }
    }

    fn ml_fit() -> MlFitResult {
        MlFitResult { yields: vec![995.0, 105.0], fcn_min: 31.2, converged: true, n_evaluations: 25 }
    }

    #[test]
    fn test_ok_row() {
        let row =
            ExperimentRow::from_fits(Ok(chi2_fit()), Ok(chi2_fit()), Ok(ml_fit()), Ok(ml_fit()));
        assert_eq!(row.status, "ok");
        assert!(row.is_finite());
        assert_eq!(row.n0_1d, 990.0);
        assert_eq!(row.var01_2d, -40.0);
        assert_eq!(row.fncmin_1dml, 31.2);
    }

    #[test]
    fn test_failed_fit_leaves_nan_sentinels() {
        let row = ExperimentRow::from_fits(
            Ok(chi2_fit()),
            Err(Error::FitNonConvergence("max iterations".into())),
            Ok(ml_fit()),
            Ok(ml_fit()),
        );
        assert_eq!(row.status, "chi2_2D");
        assert!(row.n0_2d.is_nan());
        assert!(row.pval_2d.is_nan());
        // The other fits are untouched.
        assert!(row.n0_1d.is_finite());
        assert!(!row.is_finite());
    }

    #[test]
    fn test_header_schema() {
        let row =
            ExperimentRow::from_fits(Ok(chi2_fit()), Ok(chi2_fit()), Ok(ml_fit()), Ok(ml_fit()));
        let json = serde_json::to_value(&row).unwrap();
        for col in [
            "n0_1D", "n1_1D", "var00_1D", "var01_1D", "var11_1D", "chi_1D", "pval_1D", "n0_2D",
            "n1_2D", "var00_2D", "var01_2D", "var11_2D", "chi_2D", "pval_2D", "n0_1DML", "n1_1DML",
            "fncmin_1DML", "n0_2DML", "n1_2DML", "fncmin_2DML", "status",
        ] {
            assert!(json.get(col).is_some(), "missing column {col}");
        }
    }
}
