//! Configuration module for the Umbrella runtime.
//!
//! This module provides layered configuration loading (files, environment,
//! overrides) and validation for the webhook listener, forwarding, registry,
//! authentication and logging settings.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    AuthConfig, ForwardConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig,
    RegistryConfig, ServerConfig, SpanEventConfig, UmbrellaConfig,
};
pub use validation::validate_config;
