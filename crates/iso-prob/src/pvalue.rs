//! Chi-square p-value helpers.

use iso_core::{Error, Result};
use statrs::distribution::{ChiSquared, ContinuousCDF};

fn chi_squared(dof: f64) -> Result<ChiSquared> {
    ChiSquared::new(dof)
        .map_err(|e| Error::InvalidParameter(format!("invalid degrees of freedom {dof}: {e}")))
}

/// Upper-tail probability (survival function) of the chi-square
/// distribution with `dof` degrees of freedom at `chi2`.
pub fn chi2_pvalue(chi2: f64, dof: f64) -> Result<f64> {
    if !chi2.is_finite() || chi2 < 0.0 {
        return Err(Error::InvalidParameter(format!(
            "chi2 statistic must be finite and >= 0, got {chi2}"
        )));
    }
    Ok(chi_squared(dof)?.sf(chi2))
}

/// Inverse survival function: the chi-square value whose upper-tail
/// probability at `dof` degrees of freedom is `p`.
pub fn chi2_from_pvalue(p: f64, dof: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&p) {
        return Err(Error::InvalidParameter(format!("p-value must be in [0, 1], got {p}")));
    }
    Ok(chi_squared(dof)?.inverse_cdf(1.0 - p))
}

/// Re-evaluate a p-value computed under the wrong degrees-of-freedom
/// assumption.
///
/// Recovers the chi-square statistic behind `p` via the inverse survival
/// function at `bad_dof`, then re-evaluates the survival function at
/// `good_dof`. Identity when `bad_dof == good_dof`.
pub fn correct_pvalue(p: f64, bad_dof: f64, good_dof: f64) -> Result<f64> {
    let chi2 = chi2_from_pvalue(p, bad_dof)?;
    chi2_pvalue(chi2, good_dof)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pvalue_bounds() {
        assert_relative_eq!(chi2_pvalue(0.0, 6.0).unwrap(), 1.0, epsilon = 1e-12);
        assert!(chi2_pvalue(1e3, 6.0).unwrap() < 1e-12);
    }

    #[test]
    fn test_sf_isf_round_trip() {
        for &p in &[0.01, 0.2, 0.5, 0.8, 0.99] {
            let chi2 = chi2_from_pvalue(p, 6.0).unwrap();
            assert_relative_eq!(chi2_pvalue(chi2, 6.0).unwrap(), p, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_correction_identity_when_dof_match() {
        for &p in &[0.05, 0.3, 0.77] {
            let c = correct_pvalue(p, 6.0, 6.0).unwrap();
            assert_relative_eq!(c, p, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_correction_monotone() {
        // Fewer degrees of freedom shift the chi-square distribution left,
        // so the corrected upper-tail probability shrinks.
        let mut prev = 0.0;
        for &p in &[0.1, 0.3, 0.5, 0.7, 0.9] {
            let c = correct_pvalue(p, 6.0, 5.0).unwrap();
            assert!(c < p);
            assert!(c > prev);
            prev = c;
        }
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(chi2_pvalue(-1.0, 6.0).is_err());
        assert!(chi2_pvalue(1.0, 0.0).is_err());
        assert!(chi2_from_pvalue(1.5, 6.0).is_err());
        assert!(correct_pvalue(-0.1, 6.0, 5.0).is_err());
    }
}
