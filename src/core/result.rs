use serde::{Deserialize, Serialize};

/// Per-strategy breakdown of a candidate's score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ComponentScores {
    Composite {
        cosine: f64,
        euclidean_distance: f64,
        normalized_euclidean: f64,
        slope_similarity: f64,
    },
    Dtw {
        dtw_distance: f64,
    },
    Spectral {
        fft_distance: f64,
    },
    GradientAnn {
        gradient_distance: f64,
    },
}

/// One ranked, deduplicated match. Serialized field names are stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub curve_name: String,
    pub start_index: usize,
    pub window_len: usize,
    /// The ranking score: a similarity for the composite strategy, a
    /// distance for the others.
    pub combined_score: f64,
    pub component_scores: ComponentScores,
    pub time_values: Vec<f64>,
    pub measurement_values: Vec<f64>,
    pub trend: Vec<i8>,
    pub slope: f64,
    /// DTW alignment of (sketch sample, window sample) pairs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warping_path: Option<Vec<(usize, usize)>>,
}
