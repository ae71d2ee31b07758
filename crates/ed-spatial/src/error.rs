//! Spatial-subsystem error type.

use thiserror::Error;

/// Errors produced by `ed-spatial`.  Unknown addresses and full zones are
/// not errors; they surface as empty results.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("invalid layout: {0}")]
    Layout(String),

    #[error("layout JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
