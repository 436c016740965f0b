//! Gateway error types.

use thiserror::Error;
use umbrella_core::RouterError;
use umbrella_framework::{CommandError, RegistryError};

use crate::auth::AuthError;

/// Failures the gateway records in a task, plus construction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The request could not be authenticated.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The request body is not a slash command.
    #[error("invalid command payload: {0}")]
    Command(#[from] CommandError),

    /// The command could not be resolved through the registry.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The task carries no inbound request.
    #[error("no inbound request in task")]
    MissingRequest,

    /// The root URL cannot take a function path.
    #[error("cannot resolve '{function}' against '{root}'")]
    InvalidEndpoint { root: String, function: String },

    /// The handler chain could not be built.
    #[error("failed to build gateway: {0}")]
    Router(#[from] RouterError),
}

/// Result type for gateway construction.
pub type GatewayResult<T> = Result<T, GatewayError>;
