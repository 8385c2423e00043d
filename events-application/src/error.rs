use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("forbidden")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(String),
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(anyhow::Error),
    #[error("storage error: {0}")]
    Storage(anyhow::Error),
}

impl From<events_domain::EventValidationError> for AppError {
    fn from(value: events_domain::EventValidationError) -> Self {
        AppError::Validation(value.to_string())
    }
}
