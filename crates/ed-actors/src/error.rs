use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActorError {
    #[error("unknown actor {0:?}")]
    UnknownActor(String),

    #[error("actor {name:?} is a {found}, expected a {expected}")]
    WrongRole { name: String, expected: &'static str, found: &'static str },

    #[error("scratch JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] ed_core::EdError),
}

pub type ActorResult<T> = Result<T, ActorError>;
