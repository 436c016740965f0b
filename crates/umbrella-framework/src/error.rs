//! Error types for the Umbrella framework.
//!
//! Registry errors live in [`crate::registry`].

use thiserror::Error;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors raised by an [`HttpClient`](crate::transport::HttpClient).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request never produced a response (connection refused, timeout,
    /// DNS failure, ...).
    #[error("request to {url} failed: {reason}")]
    Request {
        /// The URL that was requested.
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// The server answered with a status the caller does not accept.
    #[error("{url} answered with HTTP {status}")]
    Status {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code received.
        status: u16,
    },

    /// A listener could not bind its address.
    #[error("failed to listen on {addr}: {reason}")]
    Bind {
        /// The address that was requested.
        addr: String,
        /// Reason for failure.
        reason: String,
    },

    /// The client could not be configured.
    #[error("invalid transport configuration: {0}")]
    InvalidConfig(String),
}

impl TransportError {
    /// Creates a request error.
    pub fn request(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Request {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

// =============================================================================
// Forward Errors
// =============================================================================

/// Failures recorded in the task by the
/// [`ForwardHandler`](crate::handlers::ForwardHandler).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForwardError {
    /// The context carried no target URL.
    #[error("request url was not provided when forwarding")]
    MissingUrl,

    /// The downstream service could not be reached.
    #[error("downstream unreachable: {0}")]
    Transport(#[from] TransportError),

    /// The downstream response body could not be read.
    #[error("failed to read downstream response: {0}")]
    Read(String),
}

// =============================================================================
// Command Errors
// =============================================================================

/// Errors that can occur while parsing a slash-command payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The payload is not valid form-urlencoded data.
    #[error("malformed command payload: {0}")]
    Malformed(String),

    /// The payload has no `command` field.
    #[error("command payload has no command name")]
    MissingCommand,
}
