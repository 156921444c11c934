//! Error types for the IoT API SDK.

use thiserror::Error;

/// Result type alias for SDK operations.
pub type Result<T> = std::result::Result<T, IotError>;

/// Errors that can occur while talking to the IoT platform.
///
/// An envelope that parses but reports `success=false` is *not* an error; it is
/// surfaced through [`IotClient::check_response`](crate::IotClient::check_response).
#[derive(Debug, Error)]
pub enum IotError {
    /// Network failure or other transport-level error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded as JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server replied with a non-2xx status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Authentication exchange was rejected
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Invalid request parameters (nothing was sent)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid client or session configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl IotError {
    /// Create an API error from status and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True for parameter validation failures raised before any request.
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }
}
