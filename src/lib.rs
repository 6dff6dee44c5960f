pub mod algorithms;
pub mod core;
pub mod metrics;

pub use crate::algorithms::decode::decode_path;
pub use crate::algorithms::preprocess::{describe_sketch, prepare_curve, Sketch, MIN_SKETCH_SAMPLES};
pub use crate::algorithms::progress::{NoProgress, ProgressReporter, ProgressSink};
pub use crate::core::config::{
    DtwCost, EuclidNormalization, MatchConfig, PreprocessConfig, Strategy,
};
pub use crate::core::error::{MatchError, Result};
pub use crate::core::path::{Path, PathCommand, Point2D};
pub use crate::core::reference::{ReferenceCurve, ReferenceSet};
pub use crate::core::result::{ComponentScores, MatchResult};
pub use crate::core::shape::ShapeDescriptor;
pub use crate::core::similarity::{ScoreOrder, Scored, SimilarityStrategy};
pub use crate::metrics::composite::Composite;
pub use crate::metrics::gradient::GradientAnn;
pub use crate::metrics::spectral::Spectral;
pub use crate::metrics::warping::Warping;

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use crate::algorithms::search::search;
use crate::algorithms::windows::build_pool;
use crate::core::candidate::PreparedCurve;

/// Room for every distinct percentage, so a worker never blocks on a
/// caller that only joins.
const PROGRESS_CHANNEL_CAPACITY: usize = 128;

/// A reference set prepared for repeated sketch queries under one config.
///
/// Reference curves are preprocessed once at construction; the session is
/// cheap to clone and safe to share across threads.
///
/// # Examples
///
/// ```
/// use sketchmatch::{MatchConfig, MatchSession, NoProgress, ReferenceCurve, ReferenceSet, Sketch};
///
/// let values: Vec<f64> = (0..50).map(|i| (i as f64 * 0.3).sin()).collect();
/// let curve = ReferenceCurve::from_values("wave", values.clone()).unwrap();
/// let references = ReferenceSet::new(vec![curve]);
/// let session = MatchSession::new(references, MatchConfig::default()).unwrap();
///
/// let sketch = Sketch::series(values[10..20].to_vec());
/// let results = session.run(&sketch, &mut NoProgress).unwrap();
/// assert_eq!(results[0].start_index, 10);
/// assert!((results[0].combined_score - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct MatchSession {
    references: Arc<ReferenceSet>,
    curves: Arc<Vec<PreparedCurve>>,
    config: MatchConfig,
}

impl MatchSession {
    /// Validate `config` and preprocess every reference curve.
    pub fn new(references: impl Into<Arc<ReferenceSet>>, config: MatchConfig) -> Result<Self> {
        config.validate()?;
        let references = references.into();
        let curves = prepare_curves(&references, &config);
        debug!(curves = curves.len(), "session prepared");
        Ok(Self {
            references,
            curves: Arc::new(curves),
            config,
        })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn references(&self) -> &ReferenceSet {
        &self.references
    }

    /// Run one query on the calling thread, reporting progress to `progress`.
    pub fn run(
        &self,
        sketch: &Sketch,
        progress: &mut dyn ProgressSink,
    ) -> Result<Vec<MatchResult>> {
        execute(sketch, &self.curves, &self.references, &self.config, progress)
    }

    /// Run one query on a worker thread.
    ///
    /// Progress percentages arrive on the returned bounded channel, which
    /// closes when the query ends; the handle yields the ranked matches.
    pub fn spawn(&self, sketch: Sketch) -> (Receiver<u8>, JoinHandle<Result<Vec<MatchResult>>>) {
        let (mut tx, rx) = mpsc::sync_channel(PROGRESS_CHANNEL_CAPACITY);
        let session = self.clone();
        let handle = thread::spawn(move || session.run(&sketch, &mut tx));
        (rx, handle)
    }
}

/// One-shot query: preprocess `references`, then score, rank and
/// deduplicate every window against `sketch`.
pub fn run_match(
    sketch: &Sketch,
    references: &ReferenceSet,
    config: &MatchConfig,
    progress: &mut dyn ProgressSink,
) -> Result<Vec<MatchResult>> {
    config.validate()?;
    let curves = prepare_curves(references, config);
    execute(sketch, &curves, references, config, progress)
}

fn prepare_curves(references: &ReferenceSet, config: &MatchConfig) -> Vec<PreparedCurve> {
    let prepare = |c: &ReferenceCurve| prepare_curve(c, &config.preprocess);

    #[cfg(feature = "parallel")]
    let curves: Vec<PreparedCurve> = references.curves.par_iter().map(prepare).collect();

    #[cfg(not(feature = "parallel"))]
    let curves: Vec<PreparedCurve> = references.curves.iter().map(prepare).collect();

    curves
}

fn execute(
    sketch: &Sketch,
    curves: &[PreparedCurve],
    references: &ReferenceSet,
    config: &MatchConfig,
    progress: &mut dyn ProgressSink,
) -> Result<Vec<MatchResult>> {
    let descriptor = describe_sketch(sketch, &config.preprocess)?;
    let pool = build_pool(curves, descriptor.window_len())?;

    match config.strategy {
        Strategy::Composite {
            euclid_normalization,
            ..
        } => search(
            &Composite::new(euclid_normalization),
            &descriptor,
            &pool,
            references,
            config,
            progress,
        ),
        Strategy::Dtw {
            cost,
            band,
            normalize,
            ..
        } => search(
            &Warping {
                cost,
                band,
                normalize,
            },
            &descriptor,
            &pool,
            references,
            config,
            progress,
        ),
        Strategy::Spectral { normalize, .. } => search(
            &Spectral { normalize },
            &descriptor,
            &pool,
            references,
            config,
            progress,
        ),
        Strategy::GradientAnn { k, leaf_size, .. } => search(
            &GradientAnn { k, leaf_size },
            &descriptor,
            &pool,
            references,
            config,
            progress,
        ),
    }
}
