//! Linear two-population mixture forward model.
//!
//! Predicted count in bin `j` is `Σ_p yields[p] · fractions[p][j]`. The 1-D
//! and 2-D fit modes differ only in how the per-population fraction vectors
//! are assembled; the model itself is mode-agnostic.

use iso_core::{Error, Result};
use iso_prob::BinFractions;

/// Expected-fraction vectors for each population over a common binning.
#[derive(Debug, Clone)]
pub struct MixtureModel {
    fractions: Vec<Vec<f64>>,
    n_bins: usize,
}

impl MixtureModel {
    /// Build a model from one fraction vector per population.
    ///
    /// All vectors must share a length; unequal lengths or zero populations
    /// fail with `DimensionMismatch`.
    pub fn new(fractions: Vec<Vec<f64>>) -> Result<Self> {
        let n_bins = match fractions.first() {
            Some(f) => f.len(),
            None => {
                return Err(Error::DimensionMismatch(
                    "mixture model needs at least one population".into(),
                ))
            }
        };
        if fractions.iter().any(|f| f.len() != n_bins) {
            return Err(Error::DimensionMismatch(
                "all population fraction vectors must share a length".into(),
            ));
        }
        if n_bins == 0 {
            return Err(Error::DimensionMismatch("fraction vectors must be non-empty".into()));
        }
        Ok(Self { fractions, n_bins })
    }

    /// 1-D mode: per population, the energy and time fraction vectors are
    /// concatenated into one residual vector (energy bins first).
    pub fn concat_1d(energy: &[BinFractions], time: &[BinFractions]) -> Result<Self> {
        if energy.len() != time.len() {
            return Err(Error::DimensionMismatch(format!(
                "energy ({}) and time ({}) fraction sets must align",
                energy.len(),
                time.len()
            )));
        }
        let fractions = energy
            .iter()
            .zip(time)
            .map(|(e, t)| {
                let mut v = Vec::with_capacity(e.len() + t.len());
                v.extend_from_slice(e.fractions());
                v.extend_from_slice(t.fractions());
                v
            })
            .collect();
        Self::new(fractions)
    }

    /// 2-D mode: per population, the outer product time ⊗ energy, flattened
    /// row-major with time as rows (matching `Histogram2d`).
    pub fn outer_2d(energy: &[BinFractions], time: &[BinFractions]) -> Result<Self> {
        if energy.len() != time.len() {
            return Err(Error::DimensionMismatch(format!(
                "energy ({}) and time ({}) fraction sets must align",
                energy.len(),
                time.len()
            )));
        }
        let fractions = energy
            .iter()
            .zip(time)
            .map(|(e, t)| {
                let mut v = Vec::with_capacity(e.len() * t.len());
                for &ft in t.fractions() {
                    for &fe in e.fractions() {
                        v.push(ft * fe);
                    }
                }
                v
            })
            .collect();
        Self::new(fractions)
    }

    /// Number of bins in the (flattened) observation vector.
    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// Number of populations (free yields).
    pub fn n_populations(&self) -> usize {
        self.fractions.len()
    }

    /// Predicted counts for the given yields.
    ///
    /// Fails with `DimensionMismatch` if `yields` does not align with the
    /// populations.
    pub fn predicted(&self, yields: &[f64]) -> Result<Vec<f64>> {
        if yields.len() != self.fractions.len() {
            return Err(Error::DimensionMismatch(format!(
                "{} yields for {} populations",
                yields.len(),
                self.fractions.len()
            )));
        }
        let mut pred = vec![0.0; self.n_bins];
        for (y, fracs) in yields.iter().zip(&self.fractions) {
            for (p, f) in pred.iter_mut().zip(fracs) {
                *p += y * f;
            }
        }
        Ok(pred)
    }

    /// Smallest predicted bin count at the given yields.
    ///
    /// The study loop evaluates this at the *true* generating yields to
    /// decide whether the Gaussian chi-square treatment is safe at all.
    pub fn min_expected(&self, yields: &[f64]) -> Result<f64> {
        Ok(self.predicted(yields)?.into_iter().fold(f64::INFINITY, f64::min))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use iso_prob::{bin_fractions, Parabolic, TruncatedExponential};

    fn fraction_sets() -> (Vec<BinFractions>, Vec<BinFractions>) {
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
        (energy, time)
    }

    #[test]
    fn test_concat_layout() {
        let (energy, time) = fraction_sets();
        let m = MixtureModel::concat_1d(&energy, &time).unwrap();
        assert_eq!(m.n_bins(), 8);
        assert_eq!(m.n_populations(), 2);
        // Each population's concatenated vector sums to 2 (two unit spectra).
        let pred = m.predicted(&[1.0, 0.0]).unwrap();
        assert_relative_eq!(pred.iter().sum::<f64>(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_outer_layout_and_mass() {
        let (energy, time) = fraction_sets();
        let m = MixtureModel::outer_2d(&energy, &time).unwrap();
        assert_eq!(m.n_bins(), 16);
        // Outer product of two unit vectors still sums to 1 per population.
        let pred = m.predicted(&[1.0, 1.0]).unwrap();
        assert_relative_eq!(pred.iter().sum::<f64>(), 2.0, epsilon = 1e-9);
        // Entry (iy, ix) is the product of the per-axis fractions.
        let expected = time[0].fractions()[1] * energy[0].fractions()[2];
        let one_pop = MixtureModel::outer_2d(&energy[..1], &time[..1]).unwrap();
        let p = one_pop.predicted(&[1.0]).unwrap();
        assert_relative_eq!(p[1 * 4 + 2], expected, epsilon = 1e-15);
    }

    #[test]
    fn test_predicted_is_linear() {
        let (energy, time) = fraction_sets();
        let m = MixtureModel::concat_1d(&energy, &time).unwrap();
        let a = m.predicted(&[1000.0, 0.0]).unwrap();
        let b = m.predicted(&[0.0, 100.0]).unwrap();
        let both = m.predicted(&[1000.0, 100.0]).unwrap();
        for j in 0..m.n_bins() {
            assert_relative_eq!(both[j], a[j] + b[j], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_dimension_errors() {
        let (energy, time) = fraction_sets();
        assert!(MixtureModel::concat_1d(&energy[..1], &time).is_err());
        assert!(MixtureModel::new(vec![]).is_err());
        assert!(MixtureModel::new(vec![vec![0.5, 0.5], vec![1.0]]).is_err());
        let m = MixtureModel::concat_1d(&energy, &time).unwrap();
        assert!(m.predicted(&[1.0]).is_err());
    }

    #[test]
    fn test_min_expected() {
        let (energy, time) = fraction_sets();
        let m = MixtureModel::outer_2d(&energy, &time).unwrap();
        let min = m.min_expected(&[1000.0, 100.0]).unwrap();
        assert!(min > 0.0);
        let pred = m.predicted(&[1000.0, 100.0]).unwrap();
        assert!(pred.iter().all(|&p| p >= min));
    }
}
