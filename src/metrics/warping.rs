use std::borrow::Cow;

use crate::algorithms::common::min_max_normalize;
use crate::algorithms::dtw::{dtw, dtw_distance};
use crate::core::candidate::CandidatePool;
use crate::core::config::DtwCost;
use crate::core::error::Result;
use crate::core::result::ComponentScores;
use crate::core::shape::ShapeView;
use crate::core::similarity::{ScoreOrder, Scored, SimilarityStrategy};

/// Dynamic time warping distance between value sequences.
///
/// With `normalize`, both sequences are min-max scaled to [0, 1] first so
/// the distance reflects shape rather than level or amplitude.
#[derive(Debug, Clone)]
pub struct Warping {
    pub cost: DtwCost,
    pub band: Option<usize>,
    pub normalize: bool,
}

impl Default for Warping {
    fn default() -> Self {
        Self {
            cost: DtwCost::Absolute,
            band: None,
            normalize: true,
        }
    }
}

/// The sketch values as compared against every candidate.
#[derive(Debug, Clone)]
pub struct WarpingContext {
    pub sketch_values: Vec<f64>,
}

impl Warping {
    fn scaled<'a>(&self, values: &'a [f64]) -> Cow<'a, [f64]> {
        if self.normalize {
            Cow::Owned(min_max_normalize(values))
        } else {
            Cow::Borrowed(values)
        }
    }
}

impl SimilarityStrategy for Warping {
    type Context = WarpingContext;

    fn name(&self) -> &'static str {
        "dtw"
    }

    fn order(&self) -> ScoreOrder {
        ScoreOrder::LowerIsBetter
    }

    fn prepare(
        &self,
        sketch: &ShapeView<'_>,
        _pool: &CandidatePool<'_>,
        _survivors: &[usize],
    ) -> Result<WarpingContext> {
        Ok(WarpingContext {
            sketch_values: self.scaled(sketch.values).into_owned(),
        })
    }

    fn score(
        &self,
        _sketch: &ShapeView<'_>,
        candidate: &ShapeView<'_>,
        ctx: &WarpingContext,
    ) -> Result<Scored> {
        let values = self.scaled(candidate.values);
        let dtw_distance = dtw_distance(&ctx.sketch_values, &values, self.cost, self.band);
        Ok(Scored {
            score: dtw_distance,
            components: ComponentScores::Dtw { dtw_distance },
        })
    }

    fn warping_path(
        &self,
        _sketch: &ShapeView<'_>,
        candidate: &ShapeView<'_>,
        ctx: &WarpingContext,
    ) -> Option<Vec<(usize, usize)>> {
        let values = self.scaled(candidate.values);
        Some(dtw(&ctx.sketch_values, &values, self.cost, self.band).path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shape::ShapeDescriptor;

    fn descriptor(values: &[f64]) -> ShapeDescriptor {
        ShapeDescriptor::new(values.to_vec(), (0..values.len()).map(|i| i as f64).collect(), 0.0)
    }

    #[test]
    fn test_normalization_ignores_scale_and_offset() {
        let sketch = descriptor(&[0.0, 1.0, 3.0, 2.0, 0.5]);
        let candidate = descriptor(&[10.0, 12.0, 16.0, 14.0, 11.0]);
        let strategy = Warping::default();
        let ctx = WarpingContext {
            sketch_values: min_max_normalize(sketch.view().values),
        };
        let s = strategy.score(&sketch.view(), &candidate.view(), &ctx).unwrap();
        assert!(s.score.abs() < 1e-12, "distance {}", s.score);

        let raw = Warping {
            normalize: false,
            ..Warping::default()
        };
        let raw_ctx = WarpingContext {
            sketch_values: sketch.values.clone(),
        };
        let s = raw.score(&sketch.view(), &candidate.view(), &raw_ctx).unwrap();
        assert!(s.score > 10.0, "raw distance {}", s.score);
    }

    #[test]
    fn test_warping_path_attached() {
        let sketch = descriptor(&[0.0, 1.0, 2.0, 1.0]);
        let candidate = descriptor(&[0.0, 1.0, 2.0, 1.0]);
        let strategy = Warping::default();
        let ctx = WarpingContext {
            sketch_values: min_max_normalize(&sketch.values),
        };
        let path = strategy
            .warping_path(&sketch.view(), &candidate.view(), &ctx)
            .unwrap();
        assert_eq!(path, vec![(0, 0), (1, 1), (2, 2), (3, 3)]);
        assert_eq!(strategy.order(), ScoreOrder::LowerIsBetter);
    }
}
