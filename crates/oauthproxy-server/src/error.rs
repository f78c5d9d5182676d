//! Error types for the proxy.
//!
//! Every failure is turned into an HTTP response at the point it is detected.
//! Response bodies are deliberately generic; the specific cause only goes to
//! the log.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::credentials::{CredentialError, DecodeError};

/// Proxy error type.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Path is not one of the forwarded routes.
    #[error("not found: {0}")]
    RouteNotFound(String),

    /// Reading the inbound body failed.
    #[error("failed to read body: {0}")]
    BodyRead(String),

    /// Authorization header was not valid Basic-Auth.
    #[error("authorization failed: {0}")]
    CredentialDecoding(DecodeError),

    /// Authorization header named the wrong identity.
    #[error("authorization failed: bad username or password")]
    CredentialMismatch,

    /// `client_id` query parameter named the wrong client.
    #[error("authorization failed: bad incoming client ID")]
    ClientIdMismatch,

    /// Configured upstream URL could not be parsed.
    #[error("failed to parse upstream URL '{url}': {reason}")]
    UpstreamUrl { url: String, reason: String },

    /// The outbound request could not be built.
    #[error("failed to build outbound request: {0}")]
    OutboundConstruction(String),

    /// The round trip to upstream failed.
    #[error("fetch failed: {0}")]
    Transport(String),

    /// Streaming the upstream response back failed.
    #[error("failed to write body: {0}")]
    ResponseRelay(String),

    /// Required configuration is missing.
    #[error("service not ready: {0}")]
    NotReady(#[from] oauthproxy_config::ConfigError),
}

impl From<CredentialError> for ProxyError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::Decoding(reason) => ProxyError::CredentialDecoding(reason),
            CredentialError::Mismatch => ProxyError::CredentialMismatch,
        }
    }
}

impl ProxyError {
    /// HTTP status and stable error code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ProxyError::RouteNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ProxyError::CredentialDecoding(_)
            | ProxyError::CredentialMismatch
            | ProxyError::ClientIdMismatch => (StatusCode::FORBIDDEN, "forbidden"),
            ProxyError::BodyRead(_)
            | ProxyError::UpstreamUrl { .. }
            | ProxyError::OutboundConstruction(_)
            | ProxyError::Transport(_)
            | ProxyError::ResponseRelay(_)
            | ProxyError::NotReady(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }

    /// Message safe to show the caller.
    fn public_message(&self) -> &'static str {
        match self.status_and_code().1 {
            "not_found" => "not found",
            "forbidden" => "Authorization failed",
            _ => "internal error",
        }
    }
}

/// Result type for proxy operations.
pub type Result<T> = std::result::Result<T, ProxyError>;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let detail = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = %status, code, error = %detail, "Proxy error");
        } else {
            tracing::warn!(status = %status, code, error = %detail, "Request rejected");
        }

        let body = ErrorResponse {
            code: code.to_string(),
            message: self.public_message().to_string(),
        };

        (status, Json(body)).into_response()
    }
}
