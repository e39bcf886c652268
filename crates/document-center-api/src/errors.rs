//! Error types for the HTTP service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use document_center_core::auth::AuthError;
use document_center_core::payload::PayloadError;
use tracing::{error, warn};

/// Webhook handler errors with HTTP status code mapping
///
/// - `401 Unauthorized`: missing, malformed or wrong bearer token
/// - `400 Bad Request`: body that is neither JSON nor form data
/// - `500 Internal Server Error`: persistence or file processing failed
///
/// Response bodies are fixed strings; the detail is logged server-side
/// only.
#[derive(Debug, thiserror::Error)]
pub enum WebhookHandlerError {
    /// Authorization failed while enforcement is on
    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    /// Request body could not be parsed into a payload
    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] PayloadError),

    /// A processing step failed after every step had run
    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl WebhookHandlerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebhookHandlerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::Unauthorized(_) => "Unauthorized",
            Self::InvalidPayload(e) => {
                warn!(error = %e, "Rejected unparseable webhook body");
                "Bad Request"
            }
            Self::Internal { message } => {
                error!(error = %message, "Webhook processing incomplete");
                "Internal Server Error"
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

impl ServiceError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BindFailed { .. } => 1,
            Self::ServerFailed { .. } => 2,
            Self::Configuration(_) => 3,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
