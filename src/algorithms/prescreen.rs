#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::core::candidate::CandidatePool;

/// Mean absolute difference of two equal-length trend vectors, in `[0, 2]`.
#[inline]
pub fn trend_divergence(a: &[i8], b: &[i8]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    if a.is_empty() {
        return 0.0;
    }
    let total: u32 = a
        .iter()
        .zip(b)
        .map(|(x, y)| (*x as i16 - *y as i16).unsigned_abs() as u32)
        .sum();
    total as f64 / a.len() as f64
}

/// Ordinals of the windows whose trend diverges from the sketch's by at
/// most `threshold`, in ascending order.
pub fn prescreen(sketch_trend: &[i8], pool: &CandidatePool<'_>, threshold: f64) -> Vec<usize> {
    let keep = |ordinal: usize| {
        trend_divergence(sketch_trend, pool.shape(ordinal).trend) <= threshold
    };

    #[cfg(feature = "parallel")]
    {
        (0..pool.len()).into_par_iter().filter(|&o| keep(o)).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        (0..pool.len()).filter(|&o| keep(o)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::windows::build_pool;
    use crate::core::candidate::PreparedCurve;

    #[test]
    fn test_divergence_range() {
        assert_eq!(trend_divergence(&[1, -1, 0], &[1, -1, 0]), 0.0);
        assert_eq!(trend_divergence(&[1, 1], &[-1, -1]), 2.0);
        assert!((trend_divergence(&[1, 0, -1], &[1, 1, 1]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_prescreen_keeps_matching_trend() {
        // rises for 5 samples, then falls for 5
        let values = vec![0.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0, 0.0, -1.0];
        let curves = vec![PreparedCurve::new(
            "peak",
            (0..values.len()).map(|i| i as f64).collect(),
            values,
        )];
        let pool = build_pool(&curves, 4).unwrap();

        let rising = [1, 1, 1];
        let kept = prescreen(&rising, &pool, 0.0);
        assert_eq!(kept, vec![0, 1]);

        let everything = prescreen(&rising, &pool, 2.0);
        assert_eq!(everything.len(), pool.len());
    }
}
