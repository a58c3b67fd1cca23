//! JSON error responses for per-request translation failures.
//!
//! Authentication failures are answered by the gate as plain text; everything
//! that goes wrong after the gate is rendered here as
//! `{"error": ..., "message": ..., "status": ...}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::TranslationError;

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all translation failures.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "invalid_argument")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

// =============================================================================
// Error Conversion
// =============================================================================

impl TranslationError {
    /// HTTP status and error type identifier for this failure.
    pub fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            TranslationError::InvalidJson(_) => (StatusCode::BAD_REQUEST, "invalid_argument"),
            TranslationError::UnknownInterface(_) | TranslationError::UnknownMethod { .. } => {
                (StatusCode::NOT_FOUND, "not_found")
            }
            TranslationError::MethodNotAllowed { .. } => {
                (StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed")
            }
            TranslationError::BackendUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
            }
            TranslationError::DeadlineExceeded(_) => {
                (StatusCode::GATEWAY_TIMEOUT, "deadline_exceeded")
            }
            TranslationError::ResponseTooLarge { .. } | TranslationError::Backend(_) => {
                (StatusCode::BAD_GATEWAY, "bad_gateway")
            }
        }
    }
}

impl IntoResponse for TranslationError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_type();
        let message = self.to_string();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::NOT_FOUND {
            // Unknown paths stay at debug
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);
        (status, Json(error_response)).into_response()
    }
}
