//! Error types for tempo-grid.
//!
//! Two layers of failure exist and they are deliberately kept apart:
//!
//! - [`GridError`] covers infrastructure faults hit while loading or parsing
//!   the dataset (missing file, malformed GeoJSON, empty collection). These
//!   propagate with `?` inside the crate.
//! - [`QueryFailure`] is the result-carrying failure a query returns across
//!   the component boundary. Queries never panic and never leak a raw
//!   `GridError`; callers branch on the [`FailureKind`] tag instead of
//!   probing message strings.

use serde::Serialize;
use thiserror::Error;

/// Result type for load-time and configuration operations.
pub type Result<T> = std::result::Result<T, GridError>;

/// Result type for queries. The error side is an expected, structured
/// outcome (for example "no points in radius"), not an exception.
pub type QueryResult<T> = std::result::Result<T, QueryFailure>;

/// Infrastructure and load-time errors.
#[derive(Error, Debug)]
pub enum GridError {
    /// Underlying storage could not be read.
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    /// The file was readable but not a valid GeoJSON FeatureCollection.
    #[error("invalid GeoJSON: {0}")]
    InvalidGeoJson(String),

    /// The collection parsed but contained zero usable sample points.
    #[error("dataset contains no usable sample points")]
    EmptyDataset,

    /// Invalid input supplied to a configuration or builder call.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Classification of query failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Storage missing, unreadable, or unparseable at load time.
    DataUnavailable,
    /// Dataset loaded but holds zero usable points.
    NoData,
    /// Valid query, valid dataset, nothing within the requested radius.
    /// An expected outcome, not a fault; callers should suggest a larger
    /// radius.
    NoPointsInRadius,
}

/// A structured query failure.
///
/// Serializes with `success: false` so an HTTP layer can emit it directly,
/// mirroring the `{ success, message, error? }` convention of the rest of
/// the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryFailure {
    /// Always `false`.
    pub success: bool,
    /// What went wrong, as a tag callers can match on exhaustively.
    pub kind: FailureKind,
    /// Human-readable description.
    pub message: String,
    /// Raw error detail for infrastructure faults, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryFailure {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            kind,
            message: message.into(),
            error: None,
        }
    }

    pub(crate) fn unavailable(err: &GridError) -> Self {
        let kind = match err {
            GridError::EmptyDataset => FailureKind::NoData,
            _ => FailureKind::DataUnavailable,
        };
        Self {
            success: false,
            kind,
            message: "No sample data available.".to_string(),
            error: Some(err.to_string()),
        }
    }
}

impl std::fmt::Display for QueryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}
