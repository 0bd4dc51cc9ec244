//! Error types for collaborator clients

use std::time::Duration;
use thiserror::Error;

/// Collaborator client error
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned an error
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Request rejected before it was sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Explicit deadline elapsed before the service answered
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Client could not be configured
    #[error("Client configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Whether the failure came from reaching the service rather than from its answer.
    pub fn is_connectivity(&self) -> bool {
        match self {
            ClientError::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            ClientError::Timeout(_) => true,
            ClientError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Result type for collaborator client operations
pub type Result<T> = std::result::Result<T, ClientError>;
