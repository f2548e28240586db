//! Client error types.

use reqwest::{Method, StatusCode};
use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A required input was empty or unusable.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Claims could not be serialized or signed.
    #[error("Signing error: {0}")]
    Signing(String),

    /// The HTTP client could not be built.
    ///
    /// Also covers a server token that is not a valid header value, which an
    /// HS256 token never is in practice.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request payload could not be serialized.
    #[error("Encode error: {0}")]
    Encode(#[source] serde_json::Error),

    /// Connection, DNS or timeout failure before a response was received.
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a status of 399 or above.
    #[error("HTTP {method} {url} status {status}: {body}")]
    Status {
        /// Request method.
        method: Method,
        /// Full request URL, query included.
        url: String,
        /// Response status.
        status: StatusCode,
        /// Raw response body, empty if it could not be read.
        body: String,
    },

    /// Response body did not match the expected shape.
    #[error("Decode error: {0}")]
    Decode(#[source] serde_json::Error),
}

impl Error {
    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        Error::Precondition(message.into())
    }

    /// Check if this is a precondition error.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Error::Precondition(_))
    }

    /// Check if this is a transport-level error.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Check if the request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Transport(e) if e.is_timeout())
    }

    /// Check if the server rejected the request with an error status.
    pub fn is_status(&self) -> bool {
        matches!(self, Error::Status { .. })
    }

    /// Check if the response body could not be decoded.
    pub fn is_decode(&self) -> bool {
        matches!(self, Error::Decode(_))
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        )
    }

    /// Check if this is a rate limit error.
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(StatusCode::TOO_MANY_REQUESTS)
    }

    /// HTTP status carried by a status error.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
