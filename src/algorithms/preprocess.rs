use tracing::trace;

use crate::algorithms::decode::decode_path;
use crate::algorithms::savgol::smooth;
use crate::core::candidate::PreparedCurve;
use crate::core::config::PreprocessConfig;
use crate::core::error::{MatchError, Result};
use crate::core::path::{Path, Point2D};
use crate::core::reference::ReferenceCurve;
use crate::core::shape::{slope_per_step, ShapeDescriptor};

/// Fewest samples a sketch may have after decoding.
pub const MIN_SKETCH_SAMPLES: usize = 4;

/// Horizontal runs below this are treated as a vertical stroke.
const MIN_RUN: f64 = 1e-12;

/// A query curve.
#[derive(Debug, Clone, PartialEq)]
pub enum Sketch {
    /// A freehand stroke in canvas coordinates (y grows downward).
    Path(Path),
    /// Already-decoded canvas points.
    Points(Vec<Point2D>),
    /// Values already in measurement orientation, e.g. a window cut from a
    /// reference curve. Preprocessed like a reference window: no flip, no
    /// stretch, slope over unit steps.
    Series {
        values: Vec<f64>,
        times: Option<Vec<f64>>,
    },
}

impl Sketch {
    pub fn series(values: Vec<f64>) -> Self {
        Sketch::Series {
            values,
            times: None,
        }
    }
}

impl From<Path> for Sketch {
    fn from(path: Path) -> Self {
        Sketch::Path(path)
    }
}

/// Reduce a sketch to its shape descriptor.
pub fn describe_sketch(sketch: &Sketch, config: &PreprocessConfig) -> Result<ShapeDescriptor> {
    match sketch {
        Sketch::Path(path) => {
            let points = decode_path(path, config.tessellation)?;
            describe_points(&points, config)
        }
        Sketch::Points(points) => describe_points(points, config),
        Sketch::Series { values, times } => describe_series(values, times.as_deref(), config),
    }
}

/// Flip, stretch and smooth drawn points, then derive trend and slope.
///
/// Canvas y grows downward, so `y' = max(y) - y` puts the stroke in the
/// same orientation as the reference data. x is stretched by
/// `stretch_factor` before smoothing; the slope is rise over smoothed run.
pub fn describe_points(points: &[Point2D], config: &PreprocessConfig) -> Result<ShapeDescriptor> {
    if points.len() < MIN_SKETCH_SAMPLES {
        return Err(MatchError::InsufficientSamples {
            found: points.len(),
            required: MIN_SKETCH_SAMPLES,
        });
    }
    if let Some(index) = points.iter().position(|p| !p.is_finite()) {
        return Err(MatchError::MalformedPath {
            index,
            reason: "non-finite coordinate".to_string(),
        });
    }

    let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
    let ys: Vec<f64> = points.iter().map(|p| max_y - p.y).collect();
    let xs: Vec<f64> = points.iter().map(|p| p.x * config.stretch_factor).collect();

    let ys = smooth(&ys, config.savgol_window, config.savgol_polyorder);
    let xs = smooth(&xs, config.savgol_window, config.savgol_polyorder);

    let n = ys.len();
    let rise = ys[n - 1] - ys[0];
    let run = xs[n - 1] - xs[0];
    let slope = if run.abs() > MIN_RUN {
        rise / run
    } else {
        slope_per_step(&ys)
    };
    trace!(samples = n, slope, "described drawn sketch");

    Ok(ShapeDescriptor::new(ys, xs, slope))
}

/// Describe a value sequence the same way reference windows are described.
pub fn describe_series(
    values: &[f64],
    times: Option<&[f64]>,
    config: &PreprocessConfig,
) -> Result<ShapeDescriptor> {
    if values.len() < MIN_SKETCH_SAMPLES {
        return Err(MatchError::InsufficientSamples {
            found: values.len(),
            required: MIN_SKETCH_SAMPLES,
        });
    }
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(MatchError::MalformedPath {
            index,
            reason: "non-finite value".to_string(),
        });
    }
    let times = match times {
        Some(t) if t.len() != values.len() => {
            return Err(MatchError::InvalidReference {
                curve: "sketch".to_string(),
                reason: format!("{} time samples for {} values", t.len(), values.len()),
            })
        }
        Some(t) => t.to_vec(),
        None => (0..values.len()).map(|i| i as f64).collect(),
    };

    let values = if config.smooth_reference {
        smooth(values, config.savgol_window, config.savgol_polyorder)
    } else {
        values.to_vec()
    };
    let slope = slope_per_step(&values);
    Ok(ShapeDescriptor::new(values, times, slope))
}

/// Per-session preparation of one reference curve: optional smoothing of
/// the whole curve, then the full-length trend.
pub fn prepare_curve(curve: &ReferenceCurve, config: &PreprocessConfig) -> PreparedCurve {
    let values = if config.smooth_reference {
        smooth(&curve.values, config.savgol_window, config.savgol_polyorder)
    } else {
        curve.values.clone()
    };
    PreparedCurve::new(curve.name.clone(), curve.times.clone(), values)
}
