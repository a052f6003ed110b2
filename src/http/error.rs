//! Errors produced by the HTTP API layer.

use thiserror::Error;

/// Failure of an HTTP API request.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The token was rejected by the API.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The account lacks permission for the requested action.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request was rate limited.
    #[error("rate limited, retry after {retry_after_secs:.2}s")]
    RateLimited {
        /// How long to wait before retrying, as told by the API.
        retry_after_secs: f64,
    },

    /// The API reported a server-side failure.
    #[error("server error: HTTP {status}")]
    ServerError {
        /// The HTTP status code returned.
        status: u16,
    },

    /// Any other error response from the API.
    #[error("API error: HTTP {status} - {message}")]
    Api {
        /// The HTTP status code returned.
        status: u16,
        /// The error message carried by the response body.
        message: String,
    },

    /// The request never reached the API.
    #[error("network error: {0}")]
    Network(String),

    /// A response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl HttpError {
    pub(crate) fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub(crate) fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Whether retrying the same request later could succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::ServerError { .. } | Self::Network(_)
        )
    }
}
