//! HTTP transport.
//!
//! This module provides the HTTP client and the webhook listener.

#[cfg(feature = "http-client")]
mod client;
#[cfg(feature = "http-client")]
pub use client::ReqwestClient;

#[cfg(feature = "http-server")]
mod server;
#[cfg(feature = "http-server")]
pub use server::{ListenerHandle, listen, webhook_router};
