//! # Umbrella Transport
//!
//! Network implementations for the Umbrella request router.
//!
//! ## Features
//!
//! - `http-client`: [`ReqwestClient`], a blocking [`HttpClient`] backed by
//!   reqwest
//! - `http-server`: an axum listener that feeds webhook calls into a
//!   [`WebhookHandler`]
//! - `full`: both
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  umbrella-runtime    │  (gateway pipeline, uses both sides)
//! ├──────────────────────┤
//! │  umbrella-framework  │  (HttpClient trait, webhook types)
//! ├──────────────────────┤
//! │  umbrella-transport  │  <- This crate (implementations)
//! ├──────────────────────┤
//! │  Network (TCP/HTTP)  │
//! └──────────────────────┘
//! ```
//!
//! [`HttpClient`]: umbrella_framework::HttpClient
//! [`WebhookHandler`]: umbrella_framework::WebhookHandler

#[cfg(any(feature = "http-client", feature = "http-server"))]
pub mod http;

#[cfg(feature = "http-client")]
pub use http::ReqwestClient;

#[cfg(feature = "http-server")]
pub use http::{ListenerHandle, listen, webhook_router};
