use crate::core::shape::{slope_per_step, trend_of, ShapeView};

/// A reference curve with the per-sample data every window slices into.
///
/// Built once per session; `trend` covers the whole curve so a window's
/// trend is just a subslice.
#[derive(Debug, Clone)]
pub struct PreparedCurve {
    pub name: String,
    pub times: Vec<f64>,
    pub values: Vec<f64>,
    pub trend: Vec<i8>,
}

impl PreparedCurve {
    pub fn new(name: impl Into<String>, times: Vec<f64>, values: Vec<f64>) -> Self {
        let trend = trend_of(&values);
        Self {
            name: name.into(),
            times,
            values,
            trend,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// View of `window_len` samples starting at `start`.
    #[inline]
    pub fn window(&self, start: usize, window_len: usize) -> ShapeView<'_> {
        let values = &self.values[start..start + window_len];
        ShapeView {
            trend: &self.trend[start..start + window_len - 1],
            values,
            times: &self.times[start..start + window_len],
            slope: slope_per_step(values),
        }
    }
}

/// One sliding-window candidate. `ordinal` is its position in enumeration
/// order (curve order, then start offset) and breaks score ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateWindow {
    pub ordinal: usize,
    pub curve: usize,
    pub start_index: usize,
}

/// Every candidate window of one query.
#[derive(Debug)]
pub struct CandidatePool<'a> {
    curves: &'a [PreparedCurve],
    windows: Vec<CandidateWindow>,
    window_len: usize,
}

impl<'a> CandidatePool<'a> {
    pub(crate) fn new(
        curves: &'a [PreparedCurve],
        windows: Vec<CandidateWindow>,
        window_len: usize,
    ) -> Self {
        Self {
            curves,
            windows,
            window_len,
        }
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn window_len(&self) -> usize {
        self.window_len
    }

    pub fn windows(&self) -> &[CandidateWindow] {
        &self.windows
    }

    pub fn get(&self, ordinal: usize) -> &CandidateWindow {
        &self.windows[ordinal]
    }

    pub fn curve(&self, index: usize) -> &'a PreparedCurve {
        &self.curves[index]
    }

    /// Borrowed shape of the candidate at `ordinal`.
    #[inline]
    pub fn shape(&self, ordinal: usize) -> ShapeView<'a> {
        let w = self.windows[ordinal];
        self.curves[w.curve].window(w.start_index, self.window_len)
    }
}
