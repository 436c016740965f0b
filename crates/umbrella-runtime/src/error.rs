//! Runtime error types.

use thiserror::Error;
use umbrella_framework::{RegistryError, TransportError};

use crate::config::ConfigError;
use crate::gateway::GatewayError;

/// Errors that can occur while assembling or running the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No registry source could be loaded.
    #[error("Command registry error: {0}")]
    Registry(#[from] RegistryError),

    /// A client or listener could not be set up.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The gateway could not be built.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
