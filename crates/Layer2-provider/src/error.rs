//! Provider-specific error types

use ollamacode_foundation::Error as FoundationError;
use thiserror::Error;

/// Errors that can occur while talking to the model server
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Connection failed, DNS failure, refused, etc.
    #[error("Network error: {0}")]
    Network(String),

    /// Request did not complete in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Server returned a non-success status
    #[error("Server error: {0}")]
    ServerError(String),

    /// Model is not present on the server
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Body could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Map an HTTP status + body to the closest error kind
    pub fn from_http_status(status: u16, body: &str) -> Self {
        match status {
            404 => ProviderError::ModelNotFound(body.to_string()),
            500..=599 => ProviderError::ServerError(body.to_string()),
            _ => ProviderError::ServerError(format!("HTTP {}: {}", status, body)),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout(e.to_string())
        } else if e.is_connect() {
            ProviderError::Network(e.to_string())
        } else if e.is_decode() {
            ProviderError::InvalidResponse(e.to_string())
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

impl From<ProviderError> for FoundationError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Timeout(msg) => FoundationError::Timeout(msg),
            other => FoundationError::Collaborator(other.to_string()),
        }
    }
}
