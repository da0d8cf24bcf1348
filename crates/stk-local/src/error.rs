use thiserror::Error;

use stk_core::deploy::ClientError;

/// Error code reported for rejected requests and malformed templates.
pub const VALIDATION_ERROR_CODE: &str = "ValidationError";

#[derive(Debug, Error)]
pub enum LocalError {
    #[error("template is not valid YAML or JSON: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid template: {0}")]
    InvalidTemplate(String),

    #[error("invalid parameter '{key}': {reason}")]
    InvalidParameter { key: String, reason: String },
}

impl From<LocalError> for ClientError {
    fn from(e: LocalError) -> Self {
        ClientError::with_code(VALIDATION_ERROR_CODE, e.to_string())
    }
}
