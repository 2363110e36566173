use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::ConfigurationError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("internal error: {0}")]
    Internal(anyhow::Error),

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("this time is no longer available")]
    SchedulingConflict,

    #[error("a schedule exception already exists for this employee on {0}")]
    ExceptionConflict(String),

    #[error("requested time is outside working hours")]
    OutsideWorkingHours,

    #[error("unauthorized")]
    Unauthorized,
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ConfigurationError>() {
            Ok(config) => AppError::Configuration(config),
            Err(err) => AppError::Internal(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::SchedulingConflict => StatusCode::CONFLICT,
            AppError::ExceptionConflict(_) => StatusCode::CONFLICT,
            AppError::OutsideWorkingHours => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
