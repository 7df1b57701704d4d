//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pvlog_core::auth::SessionError;
use pvlog_core::logistics::LogisticsError;
use pvlog_core::users::StoreError;
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.as_str()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.as_str()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.as_str()),
            AppError::Internal(detail) => {
                error!(%detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        };
        let body = Json(ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            // Every auth failure is a 401, an unreachable provider included.
            SessionError::InvalidCredentials(msg)
            | SessionError::InvalidToken(msg)
            | SessionError::UpstreamUnavailable(msg) => AppError::Unauthorized(msg),
            SessionError::Store(e) => AppError::from(e),
        }
    }
}

impl From<LogisticsError> for AppError {
    fn from(e: LogisticsError) -> Self {
        match e {
            LogisticsError::NotFound(what) => AppError::NotFound(format!("{what} not found")),
            LogisticsError::Validation(msg) => AppError::Validation(msg),
            LogisticsError::DbError(e) => AppError::from(e),
        }
    }
}
