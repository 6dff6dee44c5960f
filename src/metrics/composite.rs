#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use crate::core::candidate::CandidatePool;
use crate::core::config::EuclidNormalization;
use crate::core::error::Result;
use crate::core::result::ComponentScores;
use crate::core::shape::ShapeView;
use crate::core::similarity::{ScoreOrder, Scored, SimilarityStrategy};

/// Trend/cosine/slope composite similarity.
///
/// `combined = (cosine + normalized_euclidean + slope_similarity) / 3`, where
/// - `cosine` is the cosine similarity of the two trend vectors,
/// - `normalized_euclidean = 1 - |trend_s - trend_c| / max_euclid`,
/// - `slope_similarity = 1 - |s_s - s_c| / max(|s_s|, |s_c|)`.
///
/// Edge cases:
/// - Both trend vectors all zero → cosine 1; exactly one → cosine 0
/// - `max_euclid == 0` (every candidate equals the sketch) → normalized 1
/// - Both slopes zero → slope similarity 1
#[derive(Debug, Clone, Default)]
pub struct Composite {
    pub normalization: EuclidNormalization,
}

/// The Euclidean normalizer resolved for one query.
#[derive(Debug, Clone, Copy)]
pub struct CompositeContext {
    pub max_euclid: f64,
}

impl Composite {
    pub fn new(normalization: EuclidNormalization) -> Self {
        Self { normalization }
    }
}

/// Euclidean distance between two sign vectors.
#[inline]
pub fn trend_euclidean(a: &[i8], b: &[i8]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let sq: i32 = a
        .iter()
        .zip(b)
        .map(|(x, y)| {
            let d = *x as i32 - *y as i32;
            d * d
        })
        .sum();
    (sq as f64).sqrt()
}

/// Cosine similarity of two sign vectors.
#[inline]
pub fn trend_cosine(a: &[i8], b: &[i8]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let (mut dot, mut na, mut nb) = (0i32, 0i32, 0i32);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as i32, *y as i32);
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    match (na, nb) {
        (0, 0) => 1.0,
        (0, _) | (_, 0) => 0.0,
        _ => dot as f64 / (na as f64 * nb as f64).sqrt(),
    }
}

/// Relative slope agreement, 1 for identical slopes.
#[inline]
pub fn slope_similarity(a: f64, b: f64) -> f64 {
    let scale = a.abs().max(b.abs());
    if scale == 0.0 {
        return 1.0;
    }
    1.0 - (a - b).abs() / scale
}

impl SimilarityStrategy for Composite {
    type Context = CompositeContext;

    fn name(&self) -> &'static str {
        "composite"
    }

    fn order(&self) -> ScoreOrder {
        ScoreOrder::HigherIsBetter
    }

    fn prepare(
        &self,
        sketch: &ShapeView<'_>,
        pool: &CandidatePool<'_>,
        survivors: &[usize],
    ) -> Result<CompositeContext> {
        let max_euclid = match self.normalization {
            EuclidNormalization::Analytic => 2.0 * (sketch.trend.len() as f64).sqrt(),
            EuclidNormalization::PoolMax => {
                let dist = |o: &usize| trend_euclidean(sketch.trend, pool.shape(*o).trend);

                #[cfg(feature = "parallel")]
                let max = survivors.par_iter().map(dist).reduce(|| 0.0, f64::max);

                #[cfg(not(feature = "parallel"))]
                let max = survivors.iter().map(dist).fold(0.0, f64::max);

                max
            }
        };
        debug!(max_euclid, candidates = survivors.len(), "composite normalizer");
        Ok(CompositeContext { max_euclid })
    }

    fn score(
        &self,
        sketch: &ShapeView<'_>,
        candidate: &ShapeView<'_>,
        ctx: &CompositeContext,
    ) -> Result<Scored> {
        let cosine = trend_cosine(sketch.trend, candidate.trend);
        let euclidean_distance = trend_euclidean(sketch.trend, candidate.trend);
        let normalized_euclidean = if ctx.max_euclid > 0.0 {
            1.0 - euclidean_distance / ctx.max_euclid
        } else {
            1.0
        };
        let slope_similarity = slope_similarity(sketch.slope, candidate.slope);

        Ok(Scored {
            score: (cosine + normalized_euclidean + slope_similarity) / 3.0,
            components: ComponentScores::Composite {
                cosine,
                euclidean_distance,
                normalized_euclidean,
                slope_similarity,
            },
        })
    }
}
