use tracing::debug;

use crate::core::candidate::{CandidatePool, CandidateWindow, PreparedCurve};
use crate::core::error::{MatchError, Result};

/// Enumerate every sliding window of `window_len` samples over every curve.
///
/// Windows are numbered in curve order, then by start offset. Curves
/// shorter than the window contribute nothing.
///
/// # Errors
/// `EmptyReferenceSet` if no curve is long enough for a single window.
pub fn build_pool(curves: &[PreparedCurve], window_len: usize) -> Result<CandidatePool<'_>> {
    let empty = || MatchError::EmptyReferenceSet {
        curves: curves.len(),
        window_len,
    };
    if window_len < 2 {
        return Err(empty());
    }

    let total: usize = curves
        .iter()
        .map(|c| (c.len() + 1).saturating_sub(window_len))
        .sum();
    let mut windows = Vec::with_capacity(total);

    for (curve_idx, curve) in curves.iter().enumerate() {
        if curve.len() < window_len {
            debug!(
                curve = %curve.name,
                len = curve.len(),
                window_len,
                "curve shorter than sketch, skipped"
            );
            continue;
        }
        for start_index in 0..=curve.len() - window_len {
            windows.push(CandidateWindow {
                ordinal: windows.len(),
                curve: curve_idx,
                start_index,
            });
        }
    }

    if windows.is_empty() {
        return Err(empty());
    }
    Ok(CandidatePool::new(curves, windows, window_len))
}
