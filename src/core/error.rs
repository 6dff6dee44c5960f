use thiserror::Error;

/// Errors that can reject a sketch query.
///
/// Each variant carries enough structure (offending indices, counts, curve
/// names) for a caller to build a user-facing message. Degenerate metric
/// values (zero slopes, an all-identical candidate pool) are not errors;
/// the strategies resolve them locally.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum MatchError {
    #[error("malformed path at command {index}: {reason}")]
    MalformedPath { index: usize, reason: String },

    #[error("sketch has {found} samples, at least {required} are needed")]
    InsufficientSamples { found: usize, required: usize },

    #[error("no reference curve among {curves} has at least {window_len} samples")]
    EmptyReferenceSet { curves: usize, window_len: usize },

    #[error("invalid reference curve '{curve}': {reason}")]
    InvalidReference { curve: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to build nearest-neighbor index: {0}")]
    IndexBuild(String),

    #[error("spectrum computation failed: {0}")]
    Spectrum(String),

    #[error("deadline exceeded after scoring {scored} of {total} candidates")]
    DeadlineExceeded { scored: usize, total: usize },

    #[error("failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MatchError>;
