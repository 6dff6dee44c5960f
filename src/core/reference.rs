use serde::Deserialize;

use crate::core::error::{MatchError, Result};

/// One reference time series: measurement values on a time axis.
///
/// Immutable once loaded; a session shares it read-only across queries
/// and worker threads.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceCurve {
    pub name: String,
    pub times: Vec<f64>,
    pub values: Vec<f64>,
}

impl ReferenceCurve {
    /// Create a curve, checking that both axes line up and are finite.
    pub fn new(name: impl Into<String>, times: Vec<f64>, values: Vec<f64>) -> Result<Self> {
        let name = name.into();
        if times.len() != values.len() {
            return Err(MatchError::InvalidReference {
                curve: name,
                reason: format!(
                    "{} time samples for {} values",
                    times.len(),
                    values.len()
                ),
            });
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(MatchError::InvalidReference {
                curve: name,
                reason: format!("non-finite value at sample {i}"),
            });
        }
        Ok(Self {
            name,
            times,
            values,
        })
    }

    /// A curve sampled at `0, 1, 2, ...`.
    pub fn from_values(name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        let times = (0..values.len()).map(|i| i as f64).collect();
        Self::new(name, times, values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The full collection of reference curves a session searches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceSet {
    pub curves: Vec<ReferenceCurve>,
}

impl ReferenceSet {
    pub fn new(curves: Vec<ReferenceCurve>) -> Self {
        Self { curves }
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// Parse either reference layout:
    ///
    /// - named curves: `[{"name": .., "data": [{"x": [t], "y": v}, ..]}, ..]`
    /// - matrix: `{"hcn": [[v, ..], ..], "time": [[t], ..], "names": [..]?}`
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawReferences = serde_json::from_str(json)?;
        match raw {
            RawReferences::Named(curves) => curves
                .into_iter()
                .map(|c| {
                    let mut times = Vec::with_capacity(c.data.len());
                    let mut values = Vec::with_capacity(c.data.len());
                    for (i, sample) in c.data.into_iter().enumerate() {
                        let t = sample.x.value().ok_or_else(|| MatchError::InvalidReference {
                            curve: c.name.clone(),
                            reason: format!("empty time value at sample {i}"),
                        })?;
                        times.push(t);
                        values.push(sample.y);
                    }
                    ReferenceCurve::new(c.name, times, values)
                })
                .collect::<Result<Vec<_>>>()
                .map(ReferenceSet::new),
            RawReferences::Matrix(m) => m.into_curves().map(ReferenceSet::new),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawReferences {
    Named(Vec<NamedCurve>),
    Matrix(MatrixForm),
}

#[derive(Deserialize)]
struct NamedCurve {
    name: String,
    data: Vec<RawSample>,
}

#[derive(Deserialize)]
struct RawSample {
    x: Scalar,
    y: f64,
}

/// A number that some exporters wrap in a one-element array.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Plain(f64),
    Wrapped(Vec<f64>),
}

impl Scalar {
    fn value(&self) -> Option<f64> {
        match self {
            Scalar::Plain(v) => Some(*v),
            Scalar::Wrapped(v) => v.first().copied(),
        }
    }
}

#[derive(Deserialize)]
struct MatrixForm {
    hcn: Vec<Vec<f64>>,
    time: Vec<Scalar>,
    #[serde(default)]
    names: Option<Vec<String>>,
}

impl MatrixForm {
    fn into_curves(self) -> Result<Vec<ReferenceCurve>> {
        let times = self
            .time
            .iter()
            .enumerate()
            .map(|(i, t)| {
                t.value().ok_or_else(|| MatchError::InvalidReference {
                    curve: "time".to_string(),
                    reason: format!("empty time value at sample {i}"),
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        if let Some(names) = &self.names {
            if names.len() != self.hcn.len() {
                return Err(MatchError::InvalidReference {
                    curve: "names".to_string(),
                    reason: format!("{} names for {} curves", names.len(), self.hcn.len()),
                });
            }
        }

        self.hcn
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                let name = match &self.names {
                    Some(names) => names[i].clone(),
                    None => format!("curve_{i}"),
                };
                ReferenceCurve::new(name, times.clone(), row)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_named_form_with_wrapped_x() {
        let json = r#"[
            {"name": "a", "data": [{"x": [0.0], "y": 1.0}, {"x": [0.5], "y": 2.0}]},
            {"name": "b", "data": [{"x": 3, "y": -1.0}]}
        ]"#;
        let set = ReferenceSet::from_json(json).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.curves[0].times, vec![0.0, 0.5]);
        assert_eq!(set.curves[0].values, vec![1.0, 2.0]);
        assert_eq!(set.curves[1].times, vec![3.0]);
    }

    #[test]
    fn test_matrix_form_default_names() {
        let json = r#"{"hcn": [[1, 2, 3], [4, 5, 6]], "time": [[0.1], [0.2], [0.3]]}"#;
        let set = ReferenceSet::from_json(json).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.curves[0].name, "curve_0");
        assert_eq!(set.curves[1].name, "curve_1");
        assert_eq!(set.curves[1].values, vec![4.0, 5.0, 6.0]);
        assert_eq!(set.curves[1].times, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_matrix_form_length_mismatch() {
        let json = r#"{"hcn": [[1, 2, 3]], "time": [0, 1]}"#;
        let err = ReferenceSet::from_json(json).unwrap_err();
        assert_matches!(err, MatchError::InvalidReference { ref curve, .. } if curve == "curve_0");
    }

    #[test]
    fn test_rejects_non_finite_values() {
        let err = ReferenceCurve::from_values("x", vec![1.0, f64::NAN]).unwrap_err();
        assert_matches!(err, MatchError::InvalidReference { .. });
    }
}
