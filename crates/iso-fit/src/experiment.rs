//! Fake-experiment event generation.

use iso_core::{Error, Result};
use iso_prob::Spectrum;
use rand::rngs::StdRng;

/// Raw samples of one fake experiment.
///
/// `energies` and `times` are independently owned flat vectors, each the
/// concatenation of per-population draws; both have length equal to the
/// total event count. Created per iteration and discarded once binned.
#[derive(Debug, Clone)]
pub struct ExperimentData {
    /// Energy samples, populations concatenated in order.
    pub energies: Vec<f64>,
    /// Decay-time samples, populations concatenated in order.
    pub times: Vec<f64>,
}

impl ExperimentData {
    /// Total event count.
    pub fn len(&self) -> usize {
        self.energies.len()
    }

    /// True if the experiment holds no events.
    pub fn is_empty(&self) -> bool {
        self.energies.is_empty()
    }
}

/// Throw one fake experiment: for each population `i`, draw `counts[i]`
/// energies from `energy_spectra[i]` and times from `time_spectra[i]`.
///
/// The three slices align positionally; unequal lengths fail with
/// `DimensionMismatch`. A zero count is valid and contributes nothing.
pub fn throw_experiment(
    counts: &[u64],
    energy_spectra: &[&dyn Spectrum],
    time_spectra: &[&dyn Spectrum],
    rng: &mut StdRng,
) -> Result<ExperimentData> {
    if counts.len() != energy_spectra.len() || counts.len() != time_spectra.len() {
        return Err(Error::DimensionMismatch(format!(
            "counts ({}), energy spectra ({}) and time spectra ({}) must align",
            counts.len(),
            energy_spectra.len(),
            time_spectra.len()
        )));
    }

    let total: u64 = counts.iter().sum();
    let mut energies = Vec::with_capacity(total as usize);
    let mut times = Vec::with_capacity(total as usize);
    for (i, &n) in counts.iter().enumerate() {
        energies.extend(energy_spectra[i].sample(n as usize, rng));
        times.extend(time_spectra[i].sample(n as usize, rng));
    }

    Ok(ExperimentData { energies, times })
}

#[cfg(test)]
mod tests {
    use super::*;
    use iso_prob::{Parabolic, TruncatedExponential};
    use rand::SeedableRng;

    fn spectra() -> (Parabolic, Parabolic, TruncatedExponential, TruncatedExponential) {
        (
            Parabolic::new(12.0).unwrap(),
            Parabolic::new(8.0).unwrap(),
            TruncatedExponential::new(260.0, 260.0).unwrap(),
            TruncatedExponential::new(170.0, 260.0).unwrap(),
        )
    }

    #[test]
    fn test_lengths_and_concatenation() {
        let (e0, e1, t0, t1) = spectra();
        let mut rng = StdRng::seed_from_u64(3);
        let data =
            throw_experiment(&[1000, 100], &[&e0, &e1], &[&t0, &t1], &mut rng).unwrap();
        assert_eq!(data.len(), 1100);
        assert_eq!(data.times.len(), 1100);
        // The second population's energies cannot exceed its 8 MeV endpoint.
        assert!(data.energies[1000..].iter().all(|&x| x <= 8.0));
    }

    #[test]
    fn test_zero_counts() {
        let (e0, e1, t0, t1) = spectra();
        let mut rng = StdRng::seed_from_u64(3);
        let data = throw_experiment(&[0, 0], &[&e0, &e1], &[&t0, &t1], &mut rng).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_misaligned_populations() {
        let (e0, _, t0, t1) = spectra();
        let mut rng = StdRng::seed_from_u64(3);
        let r = throw_experiment(&[10, 10], &[&e0], &[&t0, &t1], &mut rng);
        assert!(r.is_err());
    }

    #[test]
    fn test_seed_reproducibility() {
        let (e0, e1, t0, t1) = spectra();
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        let da = throw_experiment(&[50, 5], &[&e0, &e1], &[&t0, &t1], &mut a).unwrap();
        let db = throw_experiment(&[50, 5], &[&e0, &e1], &[&t0, &t1], &mut b).unwrap();
        assert_eq!(da.energies, db.energies);
        assert_eq!(da.times, db.times);
    }
}
