use tracing::debug;

use crate::core::candidate::CandidatePool;
use crate::core::similarity::{ScoreOrder, Scored};

/// A scored candidate window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedCandidate {
    pub ordinal: usize,
    pub scored: Scored,
}

/// Selection and deduplication parameters for one query.
#[derive(Debug, Clone, Copy)]
pub struct RankPolicy {
    pub order: ScoreOrder,
    /// Candidates must clear this (in `order`'s direction) to be kept.
    pub threshold: Option<f64>,
    /// Kept by raw score when nothing clears the threshold.
    pub fallback_top_n: usize,
    pub max_results: usize,
    /// Two results on one curve must start more than this many samples apart.
    pub separation: usize,
}

/// Select, sort and deduplicate scored candidates.
///
/// 1. Keep the candidates clearing the threshold; if none do, keep the
///    best `fallback_top_n` by raw score. Without a threshold all are kept.
/// 2. Sort best first; equal scores keep enumeration order.
/// 3. Walk the sorted list, accepting a candidate only when its start is
///    more than `separation` away from every accepted start on the same
///    curve, until `max_results` are accepted.
pub fn rank_candidates(
    mut scored: Vec<RankedCandidate>,
    pool: &CandidatePool<'_>,
    policy: &RankPolicy,
) -> Vec<RankedCandidate> {
    let order = policy.order;
    let by_rank = |a: &RankedCandidate, b: &RankedCandidate| {
        order
            .best_first(a.scored.score, b.scored.score)
            .then(a.ordinal.cmp(&b.ordinal))
    };

    if let Some(t) = policy.threshold {
        if scored.iter().any(|c| order.clears(c.scored.score, t)) {
            scored.retain(|c| order.clears(c.scored.score, t));
            scored.sort_by(by_rank);
        } else {
            debug!(
                candidates = scored.len(),
                threshold = t,
                fallback = policy.fallback_top_n,
                "no candidate cleared the threshold, using top scores"
            );
            scored.sort_by(by_rank);
            scored.truncate(policy.fallback_top_n);
        }
    } else {
        scored.sort_by(by_rank);
    }

    // Greedy extraction with a per-curve exclusion zone
    let mut accepted: Vec<RankedCandidate> =
        Vec::with_capacity(policy.max_results.min(scored.len()));
    for candidate in scored {
        if accepted.len() >= policy.max_results {
            break;
        }
        let window = pool.get(candidate.ordinal);
        let overlaps = accepted.iter().any(|a| {
            let other = pool.get(a.ordinal);
            other.curve == window.curve
                && other.start_index.abs_diff(window.start_index) <= policy.separation
        });
        if !overlaps {
            accepted.push(candidate);
        }
    }

    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::windows::build_pool;
    use crate::core::candidate::PreparedCurve;
    use crate::core::result::ComponentScores;

    fn curves() -> Vec<PreparedCurve> {
        (0..2)
            .map(|c| {
                let values: Vec<f64> = (0..30).map(|i| ((i + c) as f64 * 0.4).sin()).collect();
                PreparedCurve::new(format!("c{c}"), (0..30).map(|i| i as f64).collect(), values)
            })
            .collect()
    }

    fn scored(ordinal: usize, score: f64) -> RankedCandidate {
        RankedCandidate {
            ordinal,
            scored: Scored {
                score,
                components: ComponentScores::Dtw { dtw_distance: score },
            },
        }
    }

    fn policy(order: ScoreOrder, threshold: Option<f64>) -> RankPolicy {
        RankPolicy {
            order,
            threshold,
            fallback_top_n: 10,
            max_results: 10,
            separation: 4,
        }
    }

    #[test]
    fn test_threshold_then_sort() {
        let curves = curves();
        let pool = build_pool(&curves, 4).unwrap();
        let input = vec![scored(0, 0.5), scored(10, 0.95), scored(20, 0.9)];
        let out = rank_candidates(input, &pool, &policy(ScoreOrder::HigherIsBetter, Some(0.85)));
        let ordinals: Vec<usize> = out.iter().map(|c| c.ordinal).collect();
        assert_eq!(ordinals, vec![10, 20]);
    }

    #[test]
    fn test_fallback_when_nothing_clears() {
        let curves = curves();
        let pool = build_pool(&curves, 4).unwrap();
        let input: Vec<RankedCandidate> = (0..5).map(|i| scored(i * 6, 0.1 * i as f64)).collect();
        let mut p = policy(ScoreOrder::HigherIsBetter, Some(0.99));
        p.fallback_top_n = 3;
        let out = rank_candidates(input, &pool, &p);
        let ordinals: Vec<usize> = out.iter().map(|c| c.ordinal).collect();
        assert_eq!(ordinals, vec![24, 18, 12]);
    }

    #[test]
    fn test_overlap_suppression_is_per_curve() {
        let curves = curves();
        let pool = build_pool(&curves, 4).unwrap();
        // curve 0 has 27 windows (ordinals 0..27); curve 1 starts at 27
        let input = vec![
            scored(5, 0.1),
            scored(9, 0.2),  // gap 4 on curve 0: suppressed
            scored(10, 0.3), // gap 5: kept
            scored(27 + 5, 0.4),
        ];
        let out = rank_candidates(input, &pool, &policy(ScoreOrder::LowerIsBetter, None));
        let ordinals: Vec<usize> = out.iter().map(|c| c.ordinal).collect();
        assert_eq!(ordinals, vec![5, 10, 32]);
    }

    #[test]
    fn test_ties_break_by_ordinal() {
        let curves = curves();
        let pool = build_pool(&curves, 4).unwrap();
        let input = vec![scored(40, 1.0), scored(3, 1.0), scored(20, 1.0)];
        let out = rank_candidates(input, &pool, &policy(ScoreOrder::HigherIsBetter, Some(0.5)));
        let ordinals: Vec<usize> = out.iter().map(|c| c.ordinal).collect();
        assert_eq!(ordinals, vec![3, 20, 40]);
    }

    #[test]
    fn test_max_results_cap() {
        let curves = curves();
        let pool = build_pool(&curves, 4).unwrap();
        let input: Vec<RankedCandidate> = (0..10).map(|i| scored(i * 5, i as f64)).collect();
        let mut p = policy(ScoreOrder::LowerIsBetter, None);
        p.max_results = 2;
        let out = rank_candidates(input, &pool, &p);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].ordinal, 0);
    }
}
