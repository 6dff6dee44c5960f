use crate::algorithms::common::{min_max_normalize, SpectrumPlan};
use crate::core::candidate::CandidatePool;
use crate::core::error::Result;
use crate::core::result::ComponentScores;
use crate::core::shape::ShapeView;
use crate::core::similarity::{ScoreOrder, Scored, SimilarityStrategy};

/// Euclidean distance between DFT magnitude spectra.
///
/// Magnitudes discard phase, so a shape and its circular shift are at
/// distance zero. The FFT is planned once per query for the window length.
#[derive(Debug, Clone)]
pub struct Spectral {
    pub normalize: bool,
}

impl Default for Spectral {
    fn default() -> Self {
        Self { normalize: true }
    }
}

#[derive(Debug, Clone)]
pub struct SpectralContext {
    pub plan: SpectrumPlan,
    pub sketch_magnitudes: Vec<f64>,
}

impl Spectral {
    fn magnitudes(&self, plan: &SpectrumPlan, values: &[f64]) -> Result<Vec<f64>> {
        if self.normalize {
            plan.half_magnitudes(&min_max_normalize(values))
        } else {
            plan.half_magnitudes(values)
        }
    }
}

impl SimilarityStrategy for Spectral {
    type Context = SpectralContext;

    fn name(&self) -> &'static str {
        "spectral"
    }

    fn order(&self) -> ScoreOrder {
        ScoreOrder::LowerIsBetter
    }

    fn prepare(
        &self,
        sketch: &ShapeView<'_>,
        _pool: &CandidatePool<'_>,
        _survivors: &[usize],
    ) -> Result<SpectralContext> {
        let plan = SpectrumPlan::new(sketch.values.len());
        let sketch_magnitudes = self.magnitudes(&plan, sketch.values)?;
        Ok(SpectralContext {
            plan,
            sketch_magnitudes,
        })
    }

    fn score(
        &self,
        _sketch: &ShapeView<'_>,
        candidate: &ShapeView<'_>,
        ctx: &SpectralContext,
    ) -> Result<Scored> {
        let magnitudes = self.magnitudes(&ctx.plan, candidate.values)?;
        let fft_distance = ctx
            .plan
            .full_spectrum_distance(&ctx.sketch_magnitudes, &magnitudes);
        Ok(Scored {
            score: fft_distance,
            components: ComponentScores::Spectral { fft_distance },
        })
    }
}
