use serde::{Deserialize, Serialize};

/// Shape descriptor of a smoothed point or value sequence.
///
/// `trend[i]` is the sign of `values[i + 1] - values[i]`, so
/// `trend.len() == values.len() - 1` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeDescriptor {
    pub trend: Vec<i8>,
    pub slope: f64,
    pub values: Vec<f64>,
    pub times: Vec<f64>,
}

impl ShapeDescriptor {
    /// Build a descriptor from smoothed values, their time axis and a slope.
    pub fn new(values: Vec<f64>, times: Vec<f64>, slope: f64) -> Self {
        debug_assert_eq!(values.len(), times.len());
        let trend = trend_of(&values);
        Self {
            trend,
            slope,
            values,
            times,
        }
    }

    /// Number of samples; candidate windows use exactly this many.
    pub fn window_len(&self) -> usize {
        self.values.len()
    }

    pub fn view(&self) -> ShapeView<'_> {
        ShapeView {
            trend: &self.trend,
            values: &self.values,
            times: &self.times,
            slope: self.slope,
        }
    }
}

/// Borrowed form of a descriptor.
///
/// Candidate windows are slices of per-curve arrays, so scoring works on
/// views to avoid copying every window.
#[derive(Debug, Clone, Copy)]
pub struct ShapeView<'a> {
    pub trend: &'a [i8],
    pub values: &'a [f64],
    pub times: &'a [f64],
    pub slope: f64,
}

/// Sign of successive differences, in {-1, 0, +1}.
pub fn trend_of(values: &[f64]) -> Vec<i8> {
    values
        .windows(2)
        .map(|w| {
            let d = w[1] - w[0];
            if d > 0.0 {
                1
            } else if d < 0.0 {
                -1
            } else {
                0
            }
        })
        .collect()
}

/// End-to-end rise over `len - 1` uniform steps.
pub fn slope_per_step(values: &[f64]) -> f64 {
    match values {
        [first, .., last] => (last - first) / (values.len() - 1) as f64,
        _ => 0.0,
    }
}
