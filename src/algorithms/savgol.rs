//! Savitzky-Golay smoothing.
//!
//! Each output sample is the value, at that sample, of the least-squares
//! polynomial of order `polyorder` fitted over a `window`-sample
//! neighborhood. The first and last `window / 2` samples are taken from
//! the polynomial fitted to the first and last full window (the "interp"
//! edge mode).

/// Clip `(window, polyorder)` for a sequence of `n` samples: the window is
/// made odd and no longer than `n`; the order is kept below the window.
pub fn clip_params(window: usize, polyorder: usize, n: usize) -> (usize, usize) {
    let mut w = window.min(n);
    if w % 2 == 0 {
        w = w.saturating_sub(1);
    }
    let p = polyorder.min(w.saturating_sub(1));
    (w, p)
}

/// Smooth `values` with clipped parameters. Returns a copy when the
/// clipped window cannot smooth (fewer than 3 samples, or an order high
/// enough to interpolate every window exactly).
pub fn smooth(values: &[f64], window: usize, polyorder: usize) -> Vec<f64> {
    let n = values.len();
    let (w, p) = clip_params(window, polyorder, n);
    if w < 3 || p + 1 >= w {
        return values.to_vec();
    }

    let half = w / 2;
    let mut out = vec![0.0; n];

    let center = fit_weights(w, p, 0.0);
    for i in half..n - half {
        out[i] = dot(&center, &values[i - half..i + half + 1]);
    }

    let head = &values[..w];
    let tail = &values[n - w..];
    for i in 0..half {
        let z = i as f64 - half as f64;
        out[i] = dot(&fit_weights(w, p, z), head);
        // mirrored position in the last window
        out[n - 1 - i] = dot(&fit_weights(w, p, -z), tail);
    }

    out
}

#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Weights `w_k` such that `sum_k w_k * y_k` is the order-`p` least-squares
/// polynomial through `(k - half, y_k)` evaluated at offset `z`.
///
/// With Vandermonde matrix `A[k][j] = x_k^j`, the fitted value at `z` is
/// `e(z)^T (A^T A)^-1 A^T y`; the weights are `A (A^T A)^-1 e(z)`.
fn fit_weights(window: usize, polyorder: usize, z: f64) -> Vec<f64> {
    let half = (window / 2) as f64;
    let order = polyorder + 1;
    let xs: Vec<f64> = (0..window).map(|k| k as f64 - half).collect();

    let mut gram = vec![vec![0.0; order]; order];
    for (a, row) in gram.iter_mut().enumerate() {
        for (b, cell) in row.iter_mut().enumerate() {
            *cell = xs.iter().map(|x| x.powi((a + b) as i32)).sum();
        }
    }
    let rhs: Vec<f64> = (0..order).map(|a| z.powi(a as i32)).collect();
    let beta = solve(gram, rhs);

    xs.iter()
        .map(|x| {
            beta.iter()
                .enumerate()
                .map(|(a, b)| b * x.powi(a as i32))
                .sum()
        })
        .collect()
}

/// Gaussian elimination with partial pivoting. The Gram matrix of distinct
/// sample positions with more samples than unknowns is positive definite,
/// so pivots never vanish.
fn solve(mut m: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> Vec<f64> {
    let n = rhs.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))
            .unwrap_or(col);
        m.swap(col, pivot);
        rhs.swap(col, pivot);

        for row in col + 1..n {
            let factor = m[row][col] / m[col][col];
            for k in col..n {
                m[row][k] -= factor * m[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| m[row][k] * x[k]).sum();
        x[row] = (rhs[row] - tail) / m[row][row];
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_params() {
        assert_eq!(clip_params(11, 3, 100), (11, 3));
        assert_eq!(clip_params(11, 3, 4), (3, 2));
        assert_eq!(clip_params(11, 3, 7), (7, 3));
        assert_eq!(clip_params(10, 3, 100), (9, 3));
        assert_eq!(clip_params(11, 3, 1), (1, 0));
    }

    #[test]
    fn test_known_coefficients() {
        // scipy.signal.savgol_coeffs(5, 2) == [-3, 12, 17, 12, -3] / 35
        let w = fit_weights(5, 2, 0.0);
        let expected = [-3.0, 12.0, 17.0, 12.0, -3.0].map(|c| c / 35.0);
        for (a, b) in w.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12, "weights {w:?}");
        }
    }

    #[test]
    fn test_preserves_cubic() {
        let values: Vec<f64> = (0..30)
            .map(|i| {
                let t = i as f64 * 0.3;
                0.5 * t * t * t - 2.0 * t * t + t + 4.0
            })
            .collect();
        let smoothed = smooth(&values, 11, 3);
        for (i, (a, b)) in values.iter().zip(&smoothed).enumerate() {
            assert!((a - b).abs() < 1e-8, "sample {i}: {a} vs {b}");
        }
    }

    #[test]
    fn test_reduces_noise() {
        let clean: Vec<f64> = (0..60).map(|i| (i as f64 * 0.1).sin()).collect();
        let noisy: Vec<f64> = clean
            .iter()
            .enumerate()
            .map(|(i, v)| v + if i % 2 == 0 { 0.2 } else { -0.2 })
            .collect();
        let smoothed = smooth(&noisy, 11, 3);

        let err = |xs: &[f64]| -> f64 { xs.iter().zip(&clean).map(|(a, b)| (a - b).powi(2)).sum() };
        assert!(
            err(&smoothed) < err(&noisy) * 0.25,
            "smoothing should remove most alternating noise"
        );
    }

    #[test]
    fn test_short_sequence_is_exact() {
        // 4 samples clip to window 3 / order 2, which interpolates exactly
        let values = [8.0, 3.0, 6.0, 0.0];
        assert_eq!(smooth(&values, 11, 3), values.to_vec());
    }
}
