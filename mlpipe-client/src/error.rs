//! Error types for the mlpipe clients

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when calling the dispatcher or an external service
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Service returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the service
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }

    /// Whether the same request may succeed later
    ///
    /// Transport failures, throttling (429) and 5xx responses are transient;
    /// other 4xx responses mean the request itself was rejected.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed(_) => true,
            Self::ApiError { status: 429, .. } => true,
            Self::ApiError { .. } => self.is_server_error(),
            Self::ParseError(_) => false,
        }
    }
}
