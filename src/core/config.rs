use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::algorithms::decode::MAX_TESSELLATION;
use crate::core::error::{MatchError, Result};

/// How the composite strategy turns a trend-vector Euclidean distance into
/// a similarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EuclidNormalization {
    /// Divide by the largest distance in the prescreened pool. Needs a full
    /// pass over the pool before any candidate can be scored.
    #[default]
    PoolMax,
    /// Divide by the largest distance two sign vectors of this length can
    /// have, `2 * sqrt(len)`. No pass required.
    Analytic,
}

/// Per-sample cost for dynamic time warping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DtwCost {
    #[default]
    Absolute,
    Squared,
}

/// Scoring strategy, chosen per query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// Mean of trend cosine, normalized trend Euclidean and slope similarity.
    Composite {
        #[serde(default)]
        euclid_normalization: EuclidNormalization,
        /// Keep only candidates scoring at least this, if any do.
        #[serde(default = "default_composite_threshold")]
        threshold: Option<f64>,
    },
    /// Dynamic time warping over value sequences.
    Dtw {
        #[serde(default)]
        cost: DtwCost,
        /// Sakoe-Chiba radius; `None` searches the full matrix.
        #[serde(default)]
        band: Option<usize>,
        #[serde(default = "default_true")]
        normalize: bool,
        /// Keep only candidates at most this far, if any are.
        #[serde(default)]
        max_distance: Option<f64>,
    },
    /// Euclidean distance between DFT magnitude spectra.
    Spectral {
        #[serde(default = "default_true")]
        normalize: bool,
        #[serde(default)]
        max_distance: Option<f64>,
    },
    /// K nearest neighbors of the sketch's unit gradient in a ball tree.
    GradientAnn {
        #[serde(default = "default_ann_k")]
        k: usize,
        #[serde(default = "default_leaf_size")]
        leaf_size: usize,
        #[serde(default)]
        max_distance: Option<f64>,
    },
}

fn default_true() -> bool {
    true
}

fn default_composite_threshold() -> Option<f64> {
    Some(0.85)
}

fn default_ann_k() -> usize {
    100
}

fn default_leaf_size() -> usize {
    40
}

impl Strategy {
    pub fn composite() -> Self {
        Strategy::Composite {
            euclid_normalization: EuclidNormalization::default(),
            threshold: default_composite_threshold(),
        }
    }

    pub fn dtw() -> Self {
        Strategy::Dtw {
            cost: DtwCost::default(),
            band: None,
            normalize: true,
            max_distance: None,
        }
    }

    pub fn spectral() -> Self {
        Strategy::Spectral {
            normalize: true,
            max_distance: None,
        }
    }

    pub fn gradient_ann() -> Self {
        Strategy::GradientAnn {
            k: default_ann_k(),
            leaf_size: default_leaf_size(),
            max_distance: None,
        }
    }

    /// Whether larger scores are better for this strategy.
    pub fn is_similarity(&self) -> bool {
        matches!(self, Strategy::Composite { .. })
    }

    /// Score a candidate must reach to survive thresholding. Similarity
    /// strategies compare with `>=`, distance strategies with `<=`.
    pub fn threshold(&self) -> Option<f64> {
        match *self {
            Strategy::Composite { threshold, .. } => threshold,
            Strategy::Dtw { max_distance, .. }
            | Strategy::Spectral { max_distance, .. }
            | Strategy::GradientAnn { max_distance, .. } => max_distance,
        }
    }

    /// Replace the threshold (or maximum distance) of this strategy.
    pub fn with_threshold(mut self, value: Option<f64>) -> Self {
        match &mut self {
            Strategy::Composite { threshold, .. } => *threshold = value,
            Strategy::Dtw { max_distance, .. }
            | Strategy::Spectral { max_distance, .. }
            | Strategy::GradientAnn { max_distance, .. } => *max_distance = value,
        }
        self
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::composite()
    }
}

/// Geometry normalization and smoothing applied before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Horizontal stretch applied to drawn sketches only.
    pub stretch_factor: f64,
    /// Savitzky-Golay window; clipped to an odd length <= sequence length.
    pub savgol_window: usize,
    /// Savitzky-Golay polynomial order; clipped below the window length.
    pub savgol_polyorder: usize,
    /// Samples per quadratic segment when decoding a path. 0 keeps only
    /// segment end points. At most `MAX_TESSELLATION`.
    pub tessellation: usize,
    /// Smooth each reference curve (and value-series sketches) once per
    /// session. Off for reference data that is already smoothed.
    pub smooth_reference: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            stretch_factor: 1.5,
            savgol_window: 11,
            savgol_polyorder: 3,
            tessellation: 0,
            smooth_reference: false,
        }
    }
}

/// Configuration for one sketch query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub strategy: Strategy,
    pub preprocess: PreprocessConfig,
    /// Reject candidates whose mean absolute trend difference exceeds this
    /// (on the 0..=2 scale). `None` scores every candidate.
    pub prescreen_threshold: Option<f64>,
    /// Candidates kept by raw score when nothing clears the strategy threshold.
    pub fallback_top_n: usize,
    /// Maximum number of matches returned.
    pub max_results: usize,
    /// Minimum start-index gap (exclusive) between two results on the same
    /// curve. `None` uses the window length.
    pub min_separation: Option<usize>,
    /// Number of scoring batches, one progress report per batch.
    pub progress_steps: usize,
    /// Abort the query if scoring is still running after this long.
    pub deadline: Option<Duration>,
}

impl MatchConfig {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            preprocess: PreprocessConfig::default(),
            prescreen_threshold: Some(1.5),
            fallback_top_n: 10,
            max_results: 10,
            min_separation: None,
            progress_steps: 100,
            deadline: None,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_threshold(mut self, threshold: Option<f64>) -> Self {
        self.strategy = self.strategy.with_threshold(threshold);
        self
    }

    pub fn with_prescreen(mut self, threshold: Option<f64>) -> Self {
        self.prescreen_threshold = threshold;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Resolved separation for a query with the given window length.
    pub fn separation(&self, window_len: usize) -> usize {
        self.min_separation.unwrap_or(window_len)
    }

    pub fn validate(&self) -> Result<()> {
        let p = &self.preprocess;
        if !(p.stretch_factor.is_finite() && p.stretch_factor > 0.0) {
            return Err(MatchError::InvalidConfig(format!(
                "stretch_factor must be positive, got {}",
                p.stretch_factor
            )));
        }
        if p.savgol_window == 0 {
            return Err(MatchError::InvalidConfig(
                "savgol_window must be at least 1".to_string(),
            ));
        }
        if p.tessellation > MAX_TESSELLATION {
            return Err(MatchError::InvalidConfig(format!(
                "tessellation must be at most {MAX_TESSELLATION}, got {}",
                p.tessellation
            )));
        }
        if self.max_results == 0 {
            return Err(MatchError::InvalidConfig(
                "max_results must be at least 1".to_string(),
            ));
        }
        if self.progress_steps == 0 {
            return Err(MatchError::InvalidConfig(
                "progress_steps must be at least 1".to_string(),
            ));
        }
        if let Some(t) = self.prescreen_threshold {
            if !(0.0..=2.0).contains(&t) {
                return Err(MatchError::InvalidConfig(format!(
                    "prescreen_threshold must lie in [0, 2], got {t}"
                )));
            }
        }
        if matches!(self.strategy.threshold(), Some(t) if !t.is_finite()) {
            return Err(MatchError::InvalidConfig(
                "threshold must be finite".to_string(),
            ));
        }
        if let Strategy::GradientAnn { k, leaf_size, .. } = self.strategy {
            if k == 0 || leaf_size == 0 {
                return Err(MatchError::InvalidConfig(
                    "gradient_ann needs k >= 1 and leaf_size >= 1".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self::new(Strategy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_strategy_dependent_threshold() {
        assert_eq!(Strategy::composite().threshold(), Some(0.85));
        assert_eq!(Strategy::dtw().threshold(), None);
        assert_eq!(Strategy::gradient_ann().threshold(), None);

        let config = MatchConfig::new(Strategy::spectral()).with_threshold(Some(2.5));
        assert_eq!(config.strategy.threshold(), Some(2.5));
    }

    #[test]
    fn test_validate_rejects_zero_results() {
        let config = MatchConfig::default().with_max_results(0);
        assert_matches!(config.validate(), Err(MatchError::InvalidConfig(_)));
    }

    #[test]
    fn test_validate_bounds_tessellation() {
        let mut config = MatchConfig::default();
        config.preprocess.tessellation = MAX_TESSELLATION;
        assert!(config.validate().is_ok());
        config.preprocess.tessellation = 1 << 61;
        assert_matches!(config.validate(), Err(MatchError::InvalidConfig(_)));
    }

    #[test]
    fn test_config_from_partial_json() {
        let json = r#"{"strategy": {"kind": "dtw", "band": 3}, "max_results": 25}"#;
        let config: MatchConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_results, 25);
        assert_eq!(
            config.strategy,
            Strategy::Dtw {
                cost: DtwCost::Absolute,
                band: Some(3),
                normalize: true,
                max_distance: None,
            }
        );
        assert_eq!(config.preprocess.savgol_window, 11);
        assert_eq!(config.strategy.threshold(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_separation_defaults_to_window() {
        let mut config = MatchConfig::default();
        assert_eq!(config.separation(12), 12);
        config.min_separation = Some(4);
        assert_eq!(config.separation(12), 4);
    }
}
