use std::cmp::Ordering;

use crate::core::candidate::CandidatePool;
use crate::core::error::Result;
use crate::core::result::ComponentScores;
use crate::core::shape::ShapeView;

/// Which direction of a score is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreOrder {
    HigherIsBetter,
    LowerIsBetter,
}

impl ScoreOrder {
    /// Whether `score` is at least as good as `threshold`.
    #[inline]
    pub fn clears(self, score: f64, threshold: f64) -> bool {
        match self {
            ScoreOrder::HigherIsBetter => score >= threshold,
            ScoreOrder::LowerIsBetter => score <= threshold,
        }
    }

    /// Ordering that sorts the better score first.
    #[inline]
    pub fn best_first(self, a: f64, b: f64) -> Ordering {
        match self {
            ScoreOrder::HigherIsBetter => b.total_cmp(&a),
            ScoreOrder::LowerIsBetter => a.total_cmp(&b),
        }
    }
}

/// A candidate's ranking score plus its breakdown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scored {
    pub score: f64,
    pub components: ComponentScores,
}

/// Trait for the interchangeable sketch-vs-window scoring strategies.
///
/// A query runs in two phases. `prepare` sees the whole candidate pool and
/// builds any query-wide state (a global normalizer, a spatial index); it
/// is a barrier, no candidate is scored before it returns. `score` is then
/// called independently per candidate, in parallel, with that state.
pub trait SimilarityStrategy: Send + Sync {
    /// Query-wide state computed once by `prepare`.
    type Context: Send + Sync;

    fn name(&self) -> &'static str;

    fn order(&self) -> ScoreOrder;

    /// Whether the trend prescreen should run before this strategy.
    fn uses_prescreen(&self) -> bool {
        true
    }

    /// Build query-wide state. `survivors` lists the ordinals that passed
    /// the prescreen (all ordinals when it is disabled).
    fn prepare(
        &self,
        sketch: &ShapeView<'_>,
        pool: &CandidatePool<'_>,
        survivors: &[usize],
    ) -> Result<Self::Context>;

    /// Restrict scoring to these ordinals instead of the survivors.
    ///
    /// Index-backed strategies return the neighbors their index found.
    fn shortlist(&self, _ctx: &Self::Context) -> Option<Vec<usize>> {
        None
    }

    fn score(
        &self,
        sketch: &ShapeView<'_>,
        candidate: &ShapeView<'_>,
        ctx: &Self::Context,
    ) -> Result<Scored>;

    /// Alignment to attach to an accepted match, for strategies that warp.
    fn warping_path(
        &self,
        _sketch: &ShapeView<'_>,
        _candidate: &ShapeView<'_>,
        _ctx: &Self::Context,
    ) -> Option<Vec<(usize, usize)>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clears_respects_direction() {
        assert!(ScoreOrder::HigherIsBetter.clears(0.9, 0.85));
        assert!(ScoreOrder::HigherIsBetter.clears(0.85, 0.85));
        assert!(!ScoreOrder::HigherIsBetter.clears(0.8, 0.85));
        assert!(ScoreOrder::LowerIsBetter.clears(0.1, 0.5));
        assert!(!ScoreOrder::LowerIsBetter.clears(0.6, 0.5));
    }

    #[test]
    fn test_best_first() {
        let mut v = vec![0.2, 0.9, 0.5];
        v.sort_by(|a, b| ScoreOrder::HigherIsBetter.best_first(*a, *b));
        assert_eq!(v, vec![0.9, 0.5, 0.2]);
        v.sort_by(|a, b| ScoreOrder::LowerIsBetter.best_first(*a, *b));
        assert_eq!(v, vec![0.2, 0.5, 0.9]);
    }
}
