//! Umbrella Runtime - Orchestration layer for the Umbrella request router.
//!
//! This crate provides:
//! - Layered configuration (`UmbrellaConfig`, `ConfigLoader`)
//! - Logging configuration (`LoggingBuilder`)
//! - Request signature verification (`SignatureVerifier`)
//! - The webhook gateway chain (`Gateway`, `GatewayBuilder`)
//! - Runtime orchestration (`UmbrellaRuntime`)
//!
//! ```ignore
//! use umbrella_runtime::UmbrellaRuntime;
//!
//! fn main() -> anyhow::Result<()> {
//!     // Blocking clients are created here, outside the async runtime
//!     let runtime = UmbrellaRuntime::builder().build()?;
//!
//!     let rt = tokio::runtime::Runtime::new()?;
//!     rt.block_on(runtime.run())?;
//!     drop(rt);
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod runtime;

// Re-exports
pub use auth::{AuthError, AuthResult, SignatureVerifier};
pub use config::{ConfigError, ConfigLoader, ConfigResult, Profile, UmbrellaConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use gateway::{Gateway, GatewayBuilder, GatewayError, GatewayResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{RuntimeBuilder, UmbrellaRuntime, load_registry};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, event, info, instrument, span, trace, warn};
}
