use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown backoff algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("status {0} is classified as both success and failure")]
    AmbiguousStatus(String),

    #[error("invalid model: {0}")]
    Invalid(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
