//! Error types for ed-persist.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path:   PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("atomic write to {path} failed: {source}")]
    Persist {
        path:   PathBuf,
        #[source]
        source: tempfile::PersistError,
    },

    #[error("simulation {0:?} does not exist")]
    MissingRun(String),

    #[error("simulation {0:?} already exists")]
    RunExists(String),

    #[error(transparent)]
    Core(#[from] ed_core::EdError),
}

impl PersistError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PersistError::Io { path: path.into(), source }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        PersistError::Json { path: path.into(), source }
    }
}

/// Alias for `Result<T, PersistError>`.
pub type PersistResult<T> = Result<T, PersistError>;
