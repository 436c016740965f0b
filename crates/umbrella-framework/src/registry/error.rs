//! Registry error types.

use thiserror::Error;

use crate::error::TransportError;

/// Errors from loading or querying a [`CommandRegistry`](super::CommandRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The command is not registered.
    #[error("Command is not registered. Command Name: '{0}'")]
    CommandNotFound(String),

    /// The command was given without any arguments.
    #[error("No arguments received.")]
    ArgsMissing,

    /// The command exists but has no such function.
    #[error("We're embarrassed for you, but we don't know a '{function}'.")]
    FunctionNotFound {
        /// The function name as given.
        function: String,
        /// Known function names for the command, sorted.
        available: Vec<String>,
    },

    /// A file source was given an empty location.
    #[error("registry file location must not be empty")]
    EmptyLocation,

    /// A URL source was given an empty URL.
    #[error("registry url must not be empty")]
    EmptyUrl,

    /// The registry file could not be read.
    #[error("could not read registry file '{path}': {reason}")]
    Io {
        /// The file path.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// The registry could not be downloaded.
    #[error("could not download registry: {0}")]
    Fetch(#[from] TransportError),

    /// The registry contents are not valid registry JSON.
    #[error("could not parse registry contents: {0}")]
    Parse(String),

    /// Every configured source failed.
    #[error("failed to load registry from any source: {}", attempts.join("; "))]
    Exhausted {
        /// One entry per source tried, describing why it failed.
        attempts: Vec<String>,
    },
}

impl RegistryError {
    /// Returns `true` for lookup failures a user can fix by typing something
    /// else, as opposed to loading failures.
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            Self::CommandNotFound(_) | Self::ArgsMissing | Self::FunctionNotFound { .. }
        )
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
