//! Error types for TheTVDB client
//!
//! Every failure a request can run into is represented by a single closed
//! enum, so callers can match on the kind of failure and the connection's
//! retry loop can single out the recoverable "not authorized" case.

use crate::request::HttpMethod;
use thiserror::Error;

/// Errors that can occur while talking to the remote API
#[derive(Debug, Error)]
pub enum ApiError {
    /// A bearer token was empty or not shaped like a signed token
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The remote endpoint configuration cannot form a valid URI
    #[error("Malformed remote endpoint: {0}")]
    MalformedEndpoint(String),

    /// HTTP 401, the session is not (or no longer) authorized
    #[error("Not authorized: {message}")]
    NotAuthorized { message: String },

    /// HTTP 404
    #[error("Resource not found: {message}")]
    NotFound { message: String },

    /// HTTP 409
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// HTTP 503
    #[error("Service currently unavailable, please try again later")]
    ServiceUnavailable,

    /// Any other non-200 HTTP status
    #[error("Unexpected response (HTTP {status}): {message}")]
    UnexpectedResponse { status: u16, message: String },

    /// Transport level failure (connection reset, DNS failure, timeout, ...)
    #[error("Communication failure during {method} request: {source}")]
    Communication {
        method: HttpMethod,
        #[source]
        source: reqwest::Error,
    },

    /// Every attempt was answered with HTTP 401
    #[error("Maximum number of authentication retries ({retries}) exceeded")]
    MaxRetriesExceeded { retries: u32 },

    /// Authorization was requested while a previous attempt was still unresolved
    #[error("Session authorization failed, please check API key and login credentials")]
    AuthorizationFailed,

    /// The underlying HTTP client could not be initialized
    #[error("Failed to initialize HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// A precondition was violated before any network I/O took place
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A response could not be mapped onto the expected type
    #[error("Failed to deserialize API response: {0}")]
    Deserialization(#[from] serde_json::Error),
}

impl ApiError {
    /// Returns true for the one error kind the connection recovers from by
    /// re-authenticating the session.
    pub fn is_not_authorized(&self) -> bool {
        matches!(self, ApiError::NotAuthorized { .. })
    }
}

/// Convenience alias used throughout the crate
pub type Result<T, E = ApiError> = std::result::Result<T, E>;
