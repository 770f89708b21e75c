//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use vouchr_core::{ErrorClass, IssuanceError};

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - resource already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Issuance engine failure.
    #[error(transparent)]
    Issuance(#[from] IssuanceError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "already_exists", msg.clone(), None),
            Self::Issuance(err) => issuance_parts(err),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        }
    }
}

fn issuance_parts(
    err: &IssuanceError,
) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
    let status = match err.class() {
        ErrorClass::Validation => StatusCode::BAD_REQUEST,
        ErrorClass::NotFound => StatusCode::NOT_FOUND,
        ErrorClass::Business | ErrorClass::Conflict => StatusCode::CONFLICT,
        ErrorClass::Internal => {
            tracing::error!(error = %err, "Issuance failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let details = match err {
        IssuanceError::InsufficientFunds { balance, required } => Some(serde_json::json!({
            "balance": balance,
            "required": required,
        })),
        IssuanceError::OutOfStock {
            product_key,
            available,
            requested,
        } => Some(serde_json::json!({
            "product_key": product_key,
            "available": available,
            "requested": requested,
        })),
        IssuanceError::Conflict(_) => Some(serde_json::json!({ "retryable": true })),
        _ => None,
    };

    (status, err.code(), err.user_message(), details)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();

        let body = ErrorResponse {
            success: false,
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<vouchr_store::StoreError> for ApiError {
    fn from(err: vouchr_store::StoreError) -> Self {
        Self::Issuance(err.into())
    }
}
