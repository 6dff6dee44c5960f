use std::fmt;

use serde::de::{self, IgnoredAny, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::error::{self, MatchError};

/// A sampled position on the drawing canvas (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<Point2D> for kurbo::Point {
    fn from(p: Point2D) -> Self {
        kurbo::Point::new(p.x, p.y)
    }
}

impl From<kurbo::Point> for Point2D {
    fn from(p: kurbo::Point) -> Self {
        Point2D::new(p.x, p.y)
    }
}

/// One drawing command of a freehand stroke.
///
/// On the wire each command is a heterogeneous array: `["M", x, y]`,
/// `["L", x, y]` or `["Q", cx, cy, x, y]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point2D),
    LineTo(Point2D),
    QuadraticCurveTo { control: Point2D, end: Point2D },
}

impl PathCommand {
    pub fn move_to(x: f64, y: f64) -> Self {
        PathCommand::MoveTo(Point2D::new(x, y))
    }

    pub fn line_to(x: f64, y: f64) -> Self {
        PathCommand::LineTo(Point2D::new(x, y))
    }

    pub fn quad_to(cx: f64, cy: f64, x: f64, y: f64) -> Self {
        PathCommand::QuadraticCurveTo {
            control: Point2D::new(cx, cy),
            end: Point2D::new(x, y),
        }
    }

    /// The point the stroke is at after this command.
    pub fn end_point(&self) -> Point2D {
        match *self {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => p,
            PathCommand::QuadraticCurveTo { end, .. } => end,
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            PathCommand::MoveTo(_) => "M",
            PathCommand::LineTo(_) => "L",
            PathCommand::QuadraticCurveTo { .. } => "Q",
        }
    }
}

const COMMAND_TAGS: &[&str] = &["M", "L", "Q"];

impl Serialize for PathCommand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let coords: Vec<f64> = match *self {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => vec![p.x, p.y],
            PathCommand::QuadraticCurveTo { control, end } => {
                vec![control.x, control.y, end.x, end.y]
            }
        };
        let mut seq = serializer.serialize_seq(Some(coords.len() + 1))?;
        seq.serialize_element(self.tag())?;
        for c in &coords {
            seq.serialize_element(c)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for PathCommand {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CommandVisitor;

        impl<'de> Visitor<'de> for CommandVisitor {
            type Value = PathCommand;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a path command such as [\"L\", x, y] or [\"Q\", cx, cy, x, y]")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<PathCommand, A::Error> {
                let tag: String = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let arity = match tag.as_str() {
                    "M" | "L" => 2,
                    "Q" => 4,
                    other => return Err(de::Error::unknown_variant(other, COMMAND_TAGS)),
                };

                let mut c = [0.0_f64; 4];
                for (i, slot) in c.iter_mut().take(arity).enumerate() {
                    *slot = seq
                        .next_element()?
                        .ok_or_else(|| de::Error::invalid_length(i + 1, &self))?;
                }
                if seq.next_element::<IgnoredAny>()?.is_some() {
                    return Err(de::Error::invalid_length(arity + 2, &self));
                }

                Ok(match tag.as_str() {
                    "M" => PathCommand::move_to(c[0], c[1]),
                    "L" => PathCommand::line_to(c[0], c[1]),
                    _ => PathCommand::quad_to(c[0], c[1], c[2], c[3]),
                })
            }
        }

        deserializer.deserialize_seq(CommandVisitor)
    }
}

/// An ordered stroke. Must start with `MoveTo`; every later command
/// continues from the previous command's end point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path {
    pub commands: Vec<PathCommand>,
}

impl Path {
    pub fn new(commands: Vec<PathCommand>) -> Self {
        Self { commands }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Extract the stroke from a saved drawing.
    ///
    /// Accepts a layer array whose first element carries `path`, or a canvas
    /// document `{"objects": [{"type": "path", "path": [..]}, ..]}` (the
    /// first path object wins).
    pub fn from_sketch_json(json: &str) -> error::Result<Path> {
        let doc: SketchDocument = serde_json::from_str(json)?;
        let path = match doc {
            SketchDocument::Layers(layers) => layers.into_iter().next().map(|l| l.path),
            SketchDocument::Canvas { objects } => objects
                .into_iter()
                .filter(|o| o.kind.as_deref().map_or(true, |k| k == "path"))
                .find_map(|o| o.path),
        };
        path.ok_or_else(|| MatchError::MalformedPath {
            index: 0,
            reason: "drawing contains no path".to_string(),
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SketchDocument {
    Layers(Vec<PathLayer>),
    Canvas { objects: Vec<CanvasObject> },
}

#[derive(Deserialize)]
struct PathLayer {
    path: Path,
}

#[derive(Deserialize)]
struct CanvasObject {
    #[serde(rename = "type")]
    kind: Option<String>,
    path: Option<Path>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_wire_format() {
        let json = r#"[["M", 0, 0], ["L", 1.5, 5], ["Q", 2, 3, 4.0, 8]]"#;
        let path: Path = serde_json::from_str(json).unwrap();
        assert_eq!(
            path.commands,
            vec![
                PathCommand::move_to(0.0, 0.0),
                PathCommand::line_to(1.5, 5.0),
                PathCommand::quad_to(2.0, 3.0, 4.0, 8.0),
            ]
        );

        let back = serde_json::to_string(&path).unwrap();
        assert_eq!(back, r#"[["M",0.0,0.0],["L",1.5,5.0],["Q",2.0,3.0,4.0,8.0]]"#);
    }

    #[test]
    fn test_command_rejects_unknown_tag() {
        let err = serde_json::from_str::<PathCommand>(r#"["C", 1, 2, 3, 4, 5, 6]"#).unwrap_err();
        assert!(err.to_string().contains("unknown variant"), "got: {err}");
    }

    #[test]
    fn test_command_rejects_wrong_arity() {
        assert!(serde_json::from_str::<PathCommand>(r#"["L", 1]"#).is_err());
        assert!(serde_json::from_str::<PathCommand>(r#"["L", 1, 2, 3]"#).is_err());
        assert!(serde_json::from_str::<PathCommand>(r#"["Q", 1, 2]"#).is_err());
    }

    #[test]
    fn test_sketch_layer_document() {
        let json = r##"[{"path": [["M", 0, 0], ["L", 1, 5]], "stroke": "#000"}]"##;
        let path = Path::from_sketch_json(json).unwrap();
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn test_sketch_canvas_document() {
        let json = r#"{"version": "5.3.0", "objects": [
            {"type": "rect", "left": 3},
            {"type": "path", "path": [["M", 1, 1], ["Q", 2, 2, 3, 3]]}
        ]}"#;
        let path = Path::from_sketch_json(json).unwrap();
        assert_eq!(path.commands[1], PathCommand::quad_to(2.0, 2.0, 3.0, 3.0));
    }

    #[test]
    fn test_sketch_without_path() {
        let err = Path::from_sketch_json(r#"{"objects": []}"#).unwrap_err();
        assert!(matches!(err, MatchError::MalformedPath { .. }), "got {err:?}");
    }

    #[test]
    fn test_end_point() {
        assert_eq!(
            PathCommand::quad_to(1.0, 1.0, 7.0, 9.0).end_point(),
            Point2D::new(7.0, 9.0)
        );
        assert_eq!(PathCommand::line_to(2.0, 3.0).end_point(), Point2D::new(2.0, 3.0));
    }
}
