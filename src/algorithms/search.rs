use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, debug_span};

use crate::algorithms::prescreen::prescreen;
use crate::algorithms::progress::{ProgressReporter, ProgressSink};
use crate::algorithms::rank::{rank_candidates, RankPolicy, RankedCandidate};
use crate::core::candidate::CandidatePool;
use crate::core::config::MatchConfig;
use crate::core::error::{MatchError, Result};
use crate::core::reference::ReferenceSet;
use crate::core::result::MatchResult;
use crate::core::shape::{ShapeDescriptor, ShapeView};
use crate::core::similarity::{Scored, SimilarityStrategy};

/// Batches smaller than this are scored on the calling thread.
#[cfg(feature = "parallel")]
const MIN_PARALLEL_BATCH: usize = 64;

/// Score, rank and deduplicate every candidate window against a sketch.
///
/// Stages:
/// 1. Trend prescreen (skipped by strategies that opt out). If nothing
///    survives the whole pool is scored instead.
/// 2. `prepare`, a barrier over the survivors.
/// 3. Scoring in `progress_steps` batches. Each batch is a parallel map into
///    its slice of a preallocated buffer; between batches this thread
///    reports progress and checks the deadline.
/// 4. Ranking, then `MatchResult` assembly from the raw reference data.
///
/// # Errors
/// Strategy failures and `DeadlineExceeded` abort the query; no partial
/// ranking is returned.
pub fn search<S: SimilarityStrategy>(
    strategy: &S,
    sketch: &ShapeDescriptor,
    pool: &CandidatePool<'_>,
    references: &ReferenceSet,
    config: &MatchConfig,
    progress: &mut dyn ProgressSink,
) -> Result<Vec<MatchResult>> {
    let _span = debug_span!(
        "search",
        strategy = strategy.name(),
        window_len = pool.window_len()
    )
    .entered();
    let started = Instant::now();
    let mut reporter = ProgressReporter::start(progress);
    let view = sketch.view();

    let survivors: Vec<usize> = match config.prescreen_threshold {
        Some(threshold) if strategy.uses_prescreen() => {
            let kept = prescreen(&sketch.trend, pool, threshold);
            if kept.is_empty() {
                debug!(threshold, "prescreen rejected every candidate, scoring the whole pool");
                (0..pool.len()).collect()
            } else {
                kept
            }
        }
        _ => (0..pool.len()).collect(),
    };
    debug!(pool = pool.len(), survivors = survivors.len(), "prescreen done");

    let ctx = strategy.prepare(&view, pool, &survivors)?;
    let targets = strategy.shortlist(&ctx).unwrap_or(survivors);

    let total = targets.len();
    let batch_size = total.div_ceil(config.progress_steps.max(1)).max(1);
    let mut scores: Vec<Option<Scored>> = vec![None; total];
    let mut done = 0;

    for (batch, slots) in targets.chunks(batch_size).zip(scores.chunks_mut(batch_size)) {
        if let Some(deadline) = config.deadline {
            if started.elapsed() >= deadline {
                debug!(scored = done, total, "deadline exceeded");
                return Err(MatchError::DeadlineExceeded { scored: done, total });
            }
        }
        score_batch(strategy, &view, pool, &ctx, batch, slots)?;
        done += batch.len();
        reporter.update(done, total);
    }

    let scored: Vec<RankedCandidate> = targets
        .iter()
        .zip(scores)
        .filter_map(|(&ordinal, s)| s.map(|scored| RankedCandidate { ordinal, scored }))
        .collect();

    let policy = RankPolicy {
        order: strategy.order(),
        threshold: config.strategy.threshold(),
        fallback_top_n: config.fallback_top_n,
        max_results: config.max_results,
        separation: config.separation(pool.window_len()),
    };
    let ranked = rank_candidates(scored, pool, &policy);
    debug!(
        accepted = ranked.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "ranking done"
    );

    let results = ranked
        .iter()
        .map(|c| build_result(strategy, &view, pool, references, &ctx, c))
        .collect::<Result<Vec<_>>>()?;

    reporter.finish();
    Ok(results)
}

fn score_batch<S: SimilarityStrategy>(
    strategy: &S,
    sketch: &ShapeView<'_>,
    pool: &CandidatePool<'_>,
    ctx: &S::Context,
    ordinals: &[usize],
    slots: &mut [Option<Scored>],
) -> Result<()> {
    let score_one = |(slot, &ordinal): (&mut Option<Scored>, &usize)| -> Result<()> {
        *slot = Some(strategy.score(sketch, &pool.shape(ordinal), ctx)?);
        Ok(())
    };

    #[cfg(feature = "parallel")]
    if ordinals.len() >= MIN_PARALLEL_BATCH {
        return slots
            .par_iter_mut()
            .zip(ordinals.par_iter())
            .try_for_each(&score_one);
    }

    slots.iter_mut().zip(ordinals).try_for_each(&score_one)
}

fn build_result<S: SimilarityStrategy>(
    strategy: &S,
    sketch: &ShapeView<'_>,
    pool: &CandidatePool<'_>,
    references: &ReferenceSet,
    ctx: &S::Context,
    candidate: &RankedCandidate,
) -> Result<MatchResult> {
    let window = pool.get(candidate.ordinal);
    let len = pool.window_len();
    let reference = references
        .curves
        .get(window.curve)
        .filter(|c| window.start_index + len <= c.len())
        .ok_or_else(|| MatchError::InvalidReference {
            curve: pool.curve(window.curve).name.clone(),
            reason: "reference set changed after the session was prepared".to_string(),
        })?;
    let range = window.start_index..window.start_index + len;
    let shape = pool.shape(candidate.ordinal);

    Ok(MatchResult {
        curve_name: reference.name.clone(),
        start_index: window.start_index,
        window_len: len,
        combined_score: candidate.scored.score,
        component_scores: candidate.scored.components,
        time_values: reference.times[range.clone()].to_vec(),
        measurement_values: reference.values[range].to_vec(),
        trend: shape.trend.to_vec(),
        slope: shape.slope,
        warping_path: strategy.warping_path(sketch, &shape, ctx),
    })
}
