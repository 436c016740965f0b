//! Error types for building routers.
//!
//! A built [`Router`](crate::router::Router) never fails at request time;
//! handler failures are data written into the task. Only construction can go
//! wrong.

use thiserror::Error;

/// Errors that can occur while building a chain or router.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// No handler was given.
    #[error("a handler chain needs at least one handler")]
    EmptyChain,

    /// The builder was not given a request adapter.
    #[error("router is missing a request adapter")]
    MissingRequestAdapter,

    /// The builder was not given a response adapter.
    #[error("router is missing a response adapter")]
    MissingResponseAdapter,
}

/// Result type for router construction.
pub type RouterResult<T> = Result<T, RouterError>;
