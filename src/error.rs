//! Error types for Clipstream
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// This enum represents all possible errors that can occur
/// in the application. It implements `IntoResponse` to
/// automatically convert errors to appropriate HTTP responses
/// using the standard `{statusCode, data, message, success}` envelope.
#[derive(Debug, Error)]
pub enum AppError {
    /// Validation error (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication required or credentials invalid (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not authorized (403)
    #[error("{0}")]
    Forbidden(String),

    /// Referenced entity absent (404)
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness violation (409)
    #[error("{0}")]
    Conflict(String),

    /// External blob-store failure (502)
    #[error("Storage dependency error: {0}")]
    Dependency(String),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for the common "token missing" rejection
    pub fn unauthorized() -> Self {
        AppError::Unauthorized("Unauthorized request".to_string())
    }

    /// Shorthand for the common "token invalid" rejection
    pub fn invalid_token() -> Self {
        AppError::Unauthorized("Invalid access token".to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to appropriate HTTP status code
    /// and the standard JSON envelope with `success: false`.
    fn into_response(self) -> Response {
        use axum::Json;

        let (status, message, error_type) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), "validation"),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone(), "unauthorized"),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone(), "forbidden"),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), "not_found"),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone(), "conflict"),
            AppError::Dependency(msg) => (StatusCode::BAD_GATEWAY, msg.clone(), "dependency"),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
                "database",
            ),
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone(), "config"),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                "internal",
            ),
        };

        // Record error metric
        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[error_type]).inc();

        let body = Json(serde_json::json!({
            "statusCode": status.as_u16(),
            "data": serde_json::Value::Null,
            "message": message,
            "success": false,
        }));

        (status, body).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
