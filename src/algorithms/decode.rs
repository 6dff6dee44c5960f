use kurbo::{ParamCurve, QuadBez};

use crate::core::error::{MatchError, Result};
use crate::core::path::{Path, PathCommand, Point2D};

/// Largest per-segment sample count a quadratic may be split into.
pub const MAX_TESSELLATION: usize = 4096;

/// Flatten a stroke into sampled points.
///
/// `MoveTo` and `LineTo` contribute their end point. A quadratic segment
/// contributes its end point when `tessellation == 0`; otherwise it is
/// sampled at `t = i / tessellation` for `i = 1..=tessellation`, so the
/// segment start (the previous end point) is not repeated.
///
/// # Errors
/// `MalformedPath` if the stroke does not start with `MoveTo`, carries a
/// non-finite coordinate, or yields fewer than 2 points. A quadratic
/// segment with `tessellation > MAX_TESSELLATION` is also malformed.
pub fn decode_path(path: &Path, tessellation: usize) -> Result<Vec<Point2D>> {
    match path.commands.first() {
        Some(PathCommand::MoveTo(_)) => {}
        Some(_) => {
            return Err(MatchError::MalformedPath {
                index: 0,
                reason: "stroke must start with a MoveTo".to_string(),
            })
        }
        None => {
            return Err(MatchError::MalformedPath {
                index: 0,
                reason: "stroke is empty".to_string(),
            })
        }
    }

    let quads = path
        .commands
        .iter()
        .filter(|c| matches!(c, PathCommand::QuadraticCurveTo { .. }))
        .count();
    let per_quad = tessellation.clamp(1, MAX_TESSELLATION);
    let mut points = Vec::with_capacity((path.len() - quads) + quads * per_quad);
    let mut cursor = Point2D::new(0.0, 0.0);

    for (index, command) in path.commands.iter().enumerate() {
        let finite = match command {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => p.is_finite(),
            PathCommand::QuadraticCurveTo { control, end } => {
                control.is_finite() && end.is_finite()
            }
        };
        if !finite {
            return Err(MatchError::MalformedPath {
                index,
                reason: "non-finite coordinate".to_string(),
            });
        }

        match *command {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => points.push(p),
            PathCommand::QuadraticCurveTo { control, end } => {
                if tessellation == 0 {
                    points.push(end);
                } else if tessellation > MAX_TESSELLATION {
                    return Err(MatchError::MalformedPath {
                        index,
                        reason: format!("tessellation {tessellation} exceeds {MAX_TESSELLATION}"),
                    });
                } else {
                    let quad = QuadBez::new(cursor, control, end);
                    let steps = tessellation as f64;
                    points.extend(
                        (1..=tessellation).map(|i| Point2D::from(quad.eval(i as f64 / steps))),
                    );
                }
            }
        }
        cursor = command.end_point();
    }

    if points.len() < 2 {
        return Err(MatchError::MalformedPath {
            index: path.len().saturating_sub(1),
            reason: format!("stroke yields {} point, a trend needs 2", points.len()),
        });
    }

    Ok(points)
}
