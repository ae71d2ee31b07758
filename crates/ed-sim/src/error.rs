use ed_persist::PersistError;
use ed_sampler::SamplerError;
use ed_spatial::SpatialError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("bad argument for {command:?}: {reason}")]
    BadArgument {
        command: &'static str,
        reason:  String,
    },

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    Spatial(#[from] SpatialError),

    #[error(transparent)]
    Sampler(#[from] SamplerError),

    #[error(transparent)]
    Core(#[from] ed_core::EdError),

    #[error("status JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SimResult<T> = Result<T, SimError>;
