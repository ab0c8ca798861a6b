//! Error types for monitoring API calls

use std::fmt;

/// Result type alias for monitoring API calls
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that can occur while talking to the monitoring API
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The request could not be sent or no response arrived (connect, TLS, timeout)
    Request(String),

    /// The API answered with a status code that is not expected for the call
    UnexpectedStatus { status: u16, body: String },

    /// The response body could not be decoded
    InvalidResponse(String),

    /// The connection handle was already closed
    Closed,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Request(msg) => write!(f, "request to monitoring API failed: {}", msg),
            ApiError::UnexpectedStatus { status, body } => {
                write!(f, "monitoring API answered with status {}: {}", status, body)
            }
            ApiError::InvalidResponse(msg) => {
                write!(f, "invalid response from monitoring API: {}", msg)
            }
            ApiError::Closed => write!(f, "monitoring API connection is closed"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::InvalidResponse(err.to_string())
        } else {
            ApiError::Request(err.to_string())
        }
    }
}
