//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use runtime::RuntimeError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Request is well-formed but fails domain validation.
    Unprocessable(DomainError),
    /// Workflow runtime error.
    Runtime(RuntimeError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unprocessable(err) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
            ApiError::Runtime(err) => runtime_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn runtime_error_to_response(err: RuntimeError) -> (StatusCode, String) {
    match &err {
        RuntimeError::InstanceNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        RuntimeError::InstanceTerminated(_) | RuntimeError::DuplicateInstance(_) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        _ => {
            tracing::error!(error = %err, "workflow runtime error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Unprocessable(err)
    }
}

impl From<RuntimeError> for ApiError {
    fn from(err: RuntimeError) -> Self {
        ApiError::Runtime(err)
    }
}
