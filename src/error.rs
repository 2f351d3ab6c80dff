//! Error types for chat-relay
//!
//! Every failure of a relay call ends up as a [`RelayError`], which renders
//! itself as a `{"error": "..."}` JSON response. Nothing is retried.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The upstream credential is not configured. The message is deliberately
    /// generic; details only go to the server log.
    #[error("Server configuration error")]
    Misconfiguration,

    #[error("Bad request: invalid JSON")]
    InvalidJson,

    /// Inbound body exceeds `server.max_body_bytes`.
    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Missing required fields: messages and modelName")]
    MissingFields,

    #[error("Invalid message format: role must be system, user or assistant and content must be text")]
    InvalidMessage,

    /// Upstream answered with a non-success status; the status is passed through.
    #[error("Upstream API error: {message}")]
    Upstream { status: StatusCode, message: String },

    /// Upstream could not be reached, or its response could not be read.
    #[error("Failed to reach upstream: {0}")]
    Transport(String),

    /// Upstream reported success but the body was not JSON.
    #[error("Invalid upstream response: {0}")]
    InvalidUpstreamBody(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file '{path}': {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in '{path}': {reason}")]
    ConfigValidationFailed { path: String, reason: String },
}

impl RelayError {
    /// HTTP status this error is reported with
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidJson | Self::MissingFields | Self::InvalidMessage => {
                StatusCode::BAD_REQUEST
            }
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Upstream { status, .. } => *status,
            Self::Misconfiguration
            | Self::Transport(_)
            | Self::InvalidUpstreamBody(_)
            | Self::Config(_)
            | Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results
pub type RelayResult<T> = Result<T, RelayError>;
