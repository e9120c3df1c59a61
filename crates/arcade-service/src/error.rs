//! API error types and responses.

use axum::http::header::{LOCATION, SET_COOKIE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use arcade_core::ArcadeError;

use crate::auth::{clear_session_cookie, LOGIN_PATH};

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No usable session. Rendered as a redirect to the login page with the
    /// session cookie cleared.
    #[error("unauthorized")]
    Unauthorized,

    /// Valid session but the role does not permit the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid filter or form input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - username already taken.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The store refused a purchase.
    #[error("purchase failed: {0}")]
    PurchaseFailed(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            Self::Unauthorized => {
                return (
                    StatusCode::SEE_OTHER,
                    [(LOCATION, LOGIN_PATH.to_string()), (SET_COOKIE, clear_session_cookie())],
                )
                    .into_response();
            }
            Self::Forbidden(msg) => {
                tracing::warn!(reason = %msg, "Forbidden operation");
                (StatusCode::FORBIDDEN, "forbidden", msg.clone())
            }
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            Self::PurchaseFailed(msg) => (
                StatusCode::PAYMENT_REQUIRED,
                "purchase_failed",
                msg.clone(),
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ArcadeError> for ApiError {
    fn from(err: ArcadeError) -> Self {
        match err {
            ArcadeError::Identity(msg) => {
                tracing::debug!(reason = %msg, "Session rejected");
                Self::Unauthorized
            }
            ArcadeError::Unauthorized => Self::Unauthorized,
            ArcadeError::Forbidden(msg) => Self::Forbidden(msg),
            err @ (ArcadeError::InvalidFilter { .. } | ArcadeError::InvalidInput(_)) => {
                Self::BadRequest(err.to_string())
            }
            err @ ArcadeError::NotFound { .. } => Self::NotFound(err.to_string()),
            ArcadeError::Purchase(msg) => Self::PurchaseFailed(msg),
            ArcadeError::Conflict(msg) => Self::Conflict(msg),
            ArcadeError::Query(msg) | ArcadeError::Internal(msg) => Self::Internal(msg),
        }
    }
}
