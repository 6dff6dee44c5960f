use std::sync::Arc;

use realfft::{RealFftPlanner, RealToComplex};

use crate::core::error::{MatchError, Result};

/// Euclidean distance between two equal-length vectors.
#[inline]
pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Rescale to [0, 1]. A constant sequence maps to all zeros.
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = hi - lo;
    if range <= 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - lo) / range).collect()
}

/// Finite-difference derivative: central differences inside, one-sided
/// differences at both ends (unit spacing).
pub fn gradient(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => (0..n)
            .map(|i| {
                if i == 0 {
                    values[1] - values[0]
                } else if i == n - 1 {
                    values[n - 1] - values[n - 2]
                } else {
                    (values[i + 1] - values[i - 1]) / 2.0
                }
            })
            .collect(),
    }
}

/// Scale to unit L2 length in place. A zero vector is left as is.
pub fn l2_normalize(v: &mut [f64]) {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// A forward real FFT planned once for a fixed length and shared read-only
/// across worker threads.
#[derive(Clone)]
pub struct SpectrumPlan {
    fft: Arc<dyn RealToComplex<f64>>,
    len: usize,
}

impl std::fmt::Debug for SpectrumPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumPlan").field("len", &self.len).finish()
    }
}

impl SpectrumPlan {
    pub fn new(len: usize) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        Self {
            fft: planner.plan_fft_forward(len),
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// DFT magnitudes for bins `0..=len/2`. The remaining bins of the full
    /// spectrum mirror these for real input.
    pub fn half_magnitudes(&self, values: &[f64]) -> Result<Vec<f64>> {
        if values.len() != self.len {
            return Err(MatchError::Spectrum(format!(
                "planned for {} samples, got {}",
                self.len,
                values.len()
            )));
        }
        let mut input = self.fft.make_input_vec();
        input.copy_from_slice(values);
        let mut spectrum = self.fft.make_output_vec();
        self.fft
            .process(&mut input, &mut spectrum)
            .map_err(|e| MatchError::Spectrum(e.to_string()))?;
        Ok(spectrum.iter().map(|c| c.norm()).collect())
    }

    /// Euclidean distance between the full magnitude spectra of two signals,
    /// given their half spectra from `half_magnitudes`.
    ///
    /// Bin `k` and bin `len - k` have equal magnitude, so every bin except
    /// DC (and Nyquist, for even lengths) is counted twice.
    pub fn full_spectrum_distance(&self, a: &[f64], b: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), b.len());
        let nyquist = if self.len % 2 == 0 {
            Some(self.len / 2)
        } else {
            None
        };
        a.iter()
            .zip(b)
            .enumerate()
            .map(|(k, (x, y))| {
                let d = (x - y) * (x - y);
                if k == 0 || Some(k) == nyquist {
                    d
                } else {
                    2.0 * d
                }
            })
            .sum::<f64>()
            .sqrt()
    }
}
