//! Base error type.
//!
//! Sub-crates define their own error enums and wrap `EdError` as one variant
//! via `#[from]`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EdError {
    #[error("unknown role {0:?}")]
    UnknownRole(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("weighted draw: {0}")]
    Weights(#[from] rand::distributions::WeightedError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `ed-core`.
pub type EdResult<T> = Result<T, EdError>;
