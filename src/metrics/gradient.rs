#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use crate::algorithms::ball_tree::BallTree;
use crate::algorithms::common::{euclidean, gradient, l2_normalize};
use crate::core::candidate::CandidatePool;
use crate::core::error::Result;
use crate::core::result::ComponentScores;
use crate::core::shape::ShapeView;
use crate::core::similarity::{ScoreOrder, Scored, SimilarityStrategy};

/// Nearest neighbors of the sketch's unit gradient among all candidate
/// windows, via a ball tree built once per query.
///
/// Only the `k` neighbors the index returns are scored; their score is the
/// Euclidean distance between unit gradients (0 for identical shape up to
/// a positive scale, at most 2).
#[derive(Debug, Clone)]
pub struct GradientAnn {
    pub k: usize,
    pub leaf_size: usize,
}

impl Default for GradientAnn {
    fn default() -> Self {
        Self { k: 100, leaf_size: 40 }
    }
}

#[derive(Debug, Clone)]
pub struct GradientContext {
    pub sketch_gradient: Vec<f64>,
    /// `(ordinal, distance)`, nearest first.
    pub neighbors: Vec<(usize, f64)>,
}

/// Finite-difference gradient scaled to unit length.
pub fn unit_gradient(values: &[f64]) -> Vec<f64> {
    let mut g = gradient(values);
    l2_normalize(&mut g);
    g
}

impl SimilarityStrategy for GradientAnn {
    type Context = GradientContext;

    fn name(&self) -> &'static str {
        "gradient_ann"
    }

    fn order(&self) -> ScoreOrder {
        ScoreOrder::LowerIsBetter
    }

    fn uses_prescreen(&self) -> bool {
        false
    }

    fn prepare(
        &self,
        sketch: &ShapeView<'_>,
        pool: &CandidatePool<'_>,
        _survivors: &[usize],
    ) -> Result<GradientContext> {
        let row = |o: usize| unit_gradient(pool.shape(o).values);

        #[cfg(feature = "parallel")]
        let rows: Vec<Vec<f64>> = (0..pool.len()).into_par_iter().map(row).collect();

        #[cfg(not(feature = "parallel"))]
        let rows: Vec<Vec<f64>> = (0..pool.len()).map(row).collect();

        let tree = BallTree::build(rows.concat(), pool.window_len(), self.leaf_size)?;
        let sketch_gradient = unit_gradient(sketch.values);
        let neighbors = tree.query(&sketch_gradient, self.k)?;
        debug!(indexed = tree.len(), neighbors = neighbors.len(), "gradient index queried");

        Ok(GradientContext {
            sketch_gradient,
            neighbors,
        })
    }

    fn shortlist(&self, ctx: &GradientContext) -> Option<Vec<usize>> {
        let mut ordinals: Vec<usize> = ctx.neighbors.iter().map(|(o, _)| *o).collect();
        ordinals.sort_unstable();
        Some(ordinals)
    }

    fn score(
        &self,
        _sketch: &ShapeView<'_>,
        candidate: &ShapeView<'_>,
        ctx: &GradientContext,
    ) -> Result<Scored> {
        let gradient_distance = euclidean(&ctx.sketch_gradient, &unit_gradient(candidate.values));
        Ok(Scored {
            score: gradient_distance,
            components: ComponentScores::GradientAnn { gradient_distance },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::windows::build_pool;
    use crate::core::candidate::PreparedCurve;
    use crate::core::shape::ShapeDescriptor;

    #[test]
    fn test_unit_gradient() {
        let g = unit_gradient(&[0.0, 3.0, 6.0, 9.0]);
        let expected = 0.5;
        for v in &g {
            assert!((v - expected).abs() < 1e-12, "gradient {g:?}");
        }
        assert_eq!(unit_gradient(&[2.0, 2.0, 2.0]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_shortlist_contains_scaled_copy() {
        let values: Vec<f64> = (0..120)
            .map(|i| (i as f64 * 0.31).sin() + (i as f64 * 0.07).cos())
            .collect();
        let times: Vec<f64> = (0..120).map(|i| i as f64).collect();
        let curves = vec![PreparedCurve::new("c", times, values.clone())];
        let pool = build_pool(&curves, 10).unwrap();

        // 3x the window at offset 40 has the same unit gradient
        let scaled: Vec<f64> = values[40..50].iter().map(|v| v * 3.0 + 1.0).collect();
        let sketch = ShapeDescriptor::new(scaled, (0..10).map(|i| i as f64).collect(), 0.0);

        let strategy = GradientAnn { k: 5, leaf_size: 8 };
        let ctx = strategy.prepare(&sketch.view(), &pool, &[]).unwrap();
        assert_eq!(ctx.neighbors.len(), 5);
        assert_eq!(ctx.neighbors[0].0, 40);
        assert!(ctx.neighbors[0].1 < 1e-9);

        let shortlist = strategy.shortlist(&ctx).unwrap();
        assert!(shortlist.contains(&40));
        assert!(shortlist.windows(2).all(|w| w[0] < w[1]));

        let s = strategy.score(&sketch.view(), &pool.shape(40), &ctx).unwrap();
        assert!(s.score < 1e-9);
    }
}
