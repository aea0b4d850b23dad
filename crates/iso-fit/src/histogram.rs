//! Equal-width count histograms.
//!
//! Standard histogram semantics: samples outside the range are dropped,
//! never an error. Counts are integers; the fit engine converts to `f64`
//! at the boundary.

use iso_core::{Error, Result};

fn check_range(name: &str, lo: f64, hi: f64) -> Result<()> {
    if !lo.is_finite() || !hi.is_finite() || hi <= lo {
        return Err(Error::InvalidRange(format!(
            "{name} range must satisfy lo < hi with finite bounds, got ({lo}, {hi})"
        )));
    }
    Ok(())
}

fn bin_index(x: f64, lo: f64, hi: f64, nbins: usize) -> Option<usize> {
    if !x.is_finite() || x < lo || x > hi {
        return None;
    }
    // The upper edge belongs to the last bin.
    let idx = ((x - lo) / (hi - lo) * nbins as f64) as usize;
    Some(idx.min(nbins - 1))
}

/// 1-D histogram with `nbins` equal-width bins over `(lo, hi)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram1d {
    lo: f64,
    hi: f64,
    counts: Vec<u64>,
}

impl Histogram1d {
    /// Create an empty histogram. Fails with `InvalidRange` for `nbins == 0`
    /// or a degenerate range.
    pub fn new(nbins: usize, range: (f64, f64)) -> Result<Self> {
        if nbins == 0 {
            return Err(Error::InvalidRange("nbins must be >= 1".into()));
        }
        check_range("histogram", range.0, range.1)?;
        Ok(Self { lo: range.0, hi: range.1, counts: vec![0; nbins] })
    }

    /// Fill one sample; out-of-range samples are dropped.
    pub fn fill(&mut self, x: f64) {
        if let Some(i) = bin_index(x, self.lo, self.hi, self.counts.len()) {
            self.counts[i] += 1;
        }
    }

    /// Fill every sample in a slice.
    pub fn fill_all(&mut self, xs: &[f64]) {
        for &x in xs {
            self.fill(x);
        }
    }

    /// Bin counts.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Total entries binned (excludes dropped samples).
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// 2-D histogram over independent per-axis ranges.
///
/// Counts are flattened row-major with the y axis as rows: index
/// `iy * nx + ix`. This matches the layout of the outer-product fraction
/// vectors the 2-D fit consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram2d {
    x_lo: f64,
    x_hi: f64,
    y_lo: f64,
    y_hi: f64,
    nx: usize,
    ny: usize,
    counts: Vec<u64>,
}

impl Histogram2d {
    /// Create an empty 2-D histogram with `nx × ny` bins.
    pub fn new(nx: usize, ny: usize, x_range: (f64, f64), y_range: (f64, f64)) -> Result<Self> {
        if nx == 0 || ny == 0 {
            return Err(Error::InvalidRange("bin counts must be >= 1".into()));
        }
        check_range("x", x_range.0, x_range.1)?;
        check_range("y", y_range.0, y_range.1)?;
        Ok(Self {
            x_lo: x_range.0,
            x_hi: x_range.1,
            y_lo: y_range.0,
            y_hi: y_range.1,
            nx,
            ny,
            counts: vec![0; nx * ny],
        })
    }

    /// Fill one (x, y) pair; pairs outside either range are dropped.
    pub fn fill(&mut self, x: f64, y: f64) {
        let ix = bin_index(x, self.x_lo, self.x_hi, self.nx);
        let iy = bin_index(y, self.y_lo, self.y_hi, self.ny);
        if let (Some(ix), Some(iy)) = (ix, iy) {
            self.counts[iy * self.nx + ix] += 1;
        }
    }

    /// Fill aligned sample slices pairwise.
    ///
    /// Fails with `DimensionMismatch` if the slices differ in length.
    pub fn fill_pairs(&mut self, xs: &[f64], ys: &[f64]) -> Result<()> {
        if xs.len() != ys.len() {
            return Err(Error::DimensionMismatch(format!(
                "x and y sample slices differ in length: {} != {}",
                xs.len(),
                ys.len()
            )));
        }
        for (&x, &y) in xs.iter().zip(ys) {
            self.fill(x, y);
        }
        Ok(())
    }

    /// Flattened bin counts (row-major, y rows).
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Count in bin `(ix, iy)`.
    pub fn at(&self, ix: usize, iy: usize) -> u64 {
        self.counts[iy * self.nx + ix]
    }

    /// Total entries binned.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}
