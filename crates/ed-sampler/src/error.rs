use thiserror::Error;

#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("sampler data parse error: {0}")]
    Parse(String),

    #[error("wait distribution JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SamplerResult<T> = Result<T, SamplerError>;
