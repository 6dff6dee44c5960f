//! Dynamic time warping over value sequences.
//!
//! `D[i][j] = cost(a[i], b[j]) + min(D[i-1][j-1], D[i-1][j], D[i][j-1])`,
//! with the first row and column accumulated along the boundary. An
//! optional Sakoe-Chiba band restricts the search to `|i - j| <= radius`
//! (widened to the length difference so the corner stays reachable).

use crate::core::config::DtwCost;

/// Optimal alignment of two sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct DtwAlignment {
    pub distance: f64,
    /// `(i, j)` pairs from `(0, 0)` to `(n - 1, m - 1)`.
    pub path: Vec<(usize, usize)>,
}

#[inline]
fn local_cost(a: f64, b: f64, cost: DtwCost) -> f64 {
    match cost {
        DtwCost::Absolute => (a - b).abs(),
        DtwCost::Squared => (a - b) * (a - b),
    }
}

/// Reported distance for an accumulated cost. Squared costs are reported
/// as the root of their sum.
#[inline]
fn finish(total: f64, cost: DtwCost) -> f64 {
    match cost {
        DtwCost::Absolute => total,
        DtwCost::Squared => total.sqrt(),
    }
}

#[inline]
fn effective_radius(n: usize, m: usize, band: Option<usize>) -> usize {
    match band {
        Some(r) => r.max(n.abs_diff(m)),
        None => n.max(m),
    }
}

/// DTW distance in O(m) memory. Returns infinity when either input is empty.
pub fn dtw_distance(a: &[f64], b: &[f64], cost: DtwCost, band: Option<usize>) -> f64 {
    let (n, m) = (a.len(), b.len());
    if n == 0 || m == 0 {
        return f64::INFINITY;
    }
    let radius = effective_radius(n, m, band);

    let mut prev = vec![f64::INFINITY; m];
    let mut curr = vec![f64::INFINITY; m];

    for i in 0..n {
        let lo = i.saturating_sub(radius);
        let hi = (i + radius + 1).min(m);
        curr.fill(f64::INFINITY);
        for j in lo..hi {
            let c = local_cost(a[i], b[j], cost);
            let best = match (i, j) {
                (0, 0) => 0.0,
                (0, _) => curr[j - 1],
                (_, 0) => prev[0],
                _ => prev[j - 1].min(prev[j]).min(curr[j - 1]),
            };
            curr[j] = c + best;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    finish(prev[m - 1], cost)
}

/// DTW distance plus the backtraced warping path. O(n * m) memory.
///
/// The backtrace follows the cheapest predecessor, preferring the diagonal,
/// then `(i-1, j)`, then `(i, j-1)` on ties, and walks the boundary once it
/// reaches row or column 0.
pub fn dtw(a: &[f64], b: &[f64], cost: DtwCost, band: Option<usize>) -> DtwAlignment {
    let (n, m) = (a.len(), b.len());
    if n == 0 || m == 0 {
        return DtwAlignment {
            distance: f64::INFINITY,
            path: Vec::new(),
        };
    }
    let radius = effective_radius(n, m, band);

    let mut acc = vec![vec![f64::INFINITY; m]; n];
    for i in 0..n {
        let lo = i.saturating_sub(radius);
        let hi = (i + radius + 1).min(m);
        for j in lo..hi {
            let c = local_cost(a[i], b[j], cost);
            let best = match (i, j) {
                (0, 0) => 0.0,
                (0, _) => acc[0][j - 1],
                (_, 0) => acc[i - 1][0],
                _ => acc[i - 1][j - 1].min(acc[i - 1][j]).min(acc[i][j - 1]),
            };
            acc[i][j] = c + best;
        }
    }

    let mut path = Vec::with_capacity(n + m);
    let (mut i, mut j) = (n - 1, m - 1);
    path.push((i, j));
    while (i, j) != (0, 0) {
        if i == 0 {
            j -= 1;
        } else if j == 0 {
            i -= 1;
        } else {
            let diag = acc[i - 1][j - 1];
            let up = acc[i - 1][j];
            let left = acc[i][j - 1];
            if diag <= up && diag <= left {
                i -= 1;
                j -= 1;
            } else if up <= left {
                i -= 1;
            } else {
                j -= 1;
            }
        }
        path.push((i, j));
    }
    path.reverse();

    DtwAlignment {
        distance: finish(acc[n - 1][m - 1], cost),
        path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wave(n: usize, phase: f64) -> Vec<f64> {
        (0..n).map(|i| (i as f64 * 0.5 + phase).sin()).collect()
    }

    #[test]
    fn test_identical_sequences() {
        let a = wave(12, 0.0);
        let alignment = dtw(&a, &a, DtwCost::Absolute, None);
        assert_eq!(alignment.distance, 0.0);
        let diagonal: Vec<(usize, usize)> = (0..12).map(|i| (i, i)).collect();
        assert_eq!(alignment.path, diagonal);
    }

    #[test]
    fn test_absorbs_repeated_sample() {
        let a = [1.0, 2.0, 3.0];
        let b = [1.0, 2.0, 2.0, 3.0];
        let alignment = dtw(&a, &b, DtwCost::Absolute, None);
        assert_eq!(alignment.distance, 0.0);
        assert_eq!(alignment.path, vec![(0, 0), (1, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn test_two_row_matches_full_matrix() {
        let a = wave(15, 0.0);
        let b = wave(15, 0.7);
        for cost in [DtwCost::Absolute, DtwCost::Squared] {
            for band in [None, Some(0), Some(2), Some(20)] {
                let fast = dtw_distance(&a, &b, cost, band);
                let full = dtw(&a, &b, cost, band).distance;
                assert!(
                    (fast - full).abs() < 1e-12,
                    "{cost:?} band {band:?}: {fast} vs {full}"
                );
            }
        }
    }

    #[test]
    fn test_zero_band_is_lockstep() {
        let a = wave(10, 0.0);
        let b = wave(10, 1.1);
        let lockstep: f64 = a.iter().zip(&b).map(|(x, y)| (x - y).abs()).sum();
        let d = dtw_distance(&a, &b, DtwCost::Absolute, Some(0));
        assert!((d - lockstep).abs() < 1e-12, "{d} vs {lockstep}");
    }

    #[test]
    fn test_band_never_beats_full_search() {
        let a = wave(20, 0.0);
        let b = wave(20, 0.9);
        let full = dtw_distance(&a, &b, DtwCost::Absolute, None);
        let banded = dtw_distance(&a, &b, DtwCost::Absolute, Some(3));
        assert!(full <= banded + 1e-12, "full {full} > banded {banded}");
    }

    #[test]
    fn test_path_is_monotone_and_connected() {
        let a = wave(9, 0.0);
        let b = wave(13, 0.4);
        let path = dtw(&a, &b, DtwCost::Squared, Some(2)).path;
        assert_eq!(path.first(), Some(&(0, 0)));
        assert_eq!(path.last(), Some(&(8, 12)));
        for w in path.windows(2) {
            let (di, dj) = (w[1].0 - w[0].0, w[1].1 - w[0].1);
            assert!(di <= 1 && dj <= 1 && di + dj >= 1, "step {:?} -> {:?}", w[0], w[1]);
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(dtw_distance(&[], &[1.0], DtwCost::Absolute, None).is_infinite());
        assert!(dtw(&[1.0], &[], DtwCost::Absolute, None).path.is_empty());
    }
}
