use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use events_application::AppError;

#[derive(Debug)]
pub enum HttpError {
    Unauthorized,
    BadRequest(String),
    Forbidden,
    NotFound(String),
    BadGateway,
    Internal,
}

impl From<AppError> for HttpError {
    fn from(value: AppError) -> Self {
        match value {
            AppError::Validation(msg) => HttpError::BadRequest(msg),
            AppError::Forbidden => HttpError::Forbidden,
            AppError::NotFound(what) => HttpError::NotFound(what),
            AppError::UpstreamUnavailable(err) => {
                error!(error = %err, "request failed on upstream dependency");
                HttpError::BadGateway
            }
            AppError::Storage(err) => {
                error!(error = %err, "request failed on storage");
                HttpError::Internal
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            HttpError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, format!("bad request: {}", msg)),
            HttpError::Forbidden => (StatusCode::FORBIDDEN, "forbidden".to_string()),
            HttpError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
            HttpError::BadGateway => (
                StatusCode::BAD_GATEWAY,
                "upstream service unavailable".to_string(),
            ),
            HttpError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
            ),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
