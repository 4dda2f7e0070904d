//! API error type and the mapping from domain errors to HTTP responses.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use tripmate_core::error::TripmateError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Upstream failure: {0}")]
    BadGateway(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE"),
            ApiError::BadGateway(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_FAILURE"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => msg,
            ApiError::Unavailable(detail) => {
                error!(%detail, "Store unavailable");
                "store temporarily unavailable, retry later".to_string()
            }
            ApiError::BadGateway(detail) => {
                error!(%detail, "Collaborator failure");
                "an upstream service failed".to_string()
            }
            ApiError::Internal(detail) => {
                error!(%detail, "Internal error");
                "internal error".to_string()
            }
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<TripmateError> for ApiError {
    fn from(err: TripmateError) -> Self {
        match err {
            TripmateError::Validation { message } => ApiError::BadRequest(message),
            TripmateError::AuthenticationFailed { reason } => ApiError::Unauthorized(reason),
            TripmateError::AuthorizationDenied { reason } => ApiError::Forbidden(reason),
            e @ TripmateError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            e @ TripmateError::AlreadyExists { .. } => ApiError::Conflict(e.to_string()),
            TripmateError::InvalidState { message } => ApiError::Conflict(message),
            TripmateError::Database(detail) => ApiError::Unavailable(detail),
            e @ (TripmateError::NotificationDelivery(_)
            | TripmateError::AssetStorage(_)
            | TripmateError::Payment(_)) => ApiError::BadGateway(e.to_string()),
            TripmateError::Internal(detail) => ApiError::Internal(detail),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
