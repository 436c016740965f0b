//! # Umbrella
//!
//! A synchronous middleware router that forwards chat slash commands to
//! serverless functions.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────────────────── Gateway ───────────────────────────────┐
//! │ Listener │──▶│ RequestLog ─▶ Authenticate ─▶ ResolveEndpoint ─▶ Forward ─▶ function │
//! │  (axum)  │◀──│ response adapter (always 200, errors in body)                          │
//! └──────────┘   └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **Core**: the handler chain, its per-request containers and the router
//! - **Framework**: task keys, forwarding, slash-command parsing and the
//!   command registry
//! - **Transport**: reqwest client and axum webhook listener
//! - **Runtime**: configuration, logging, signature checks and the gateway
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use umbrella::prelude::*;
//!
//! struct Shout;
//!
//! impl Handler for Shout {
//!     fn execute(&self, _ctx: &mut Context, task: &mut Task) {
//!         let loud = task.body().unwrap_or_default().to_uppercase();
//!         task.set_body(loud);
//!     }
//! }
//!
//! let router: Router<String, String> = Router::builder()
//!     .request_adapter(|body: String| {
//!         let mut task = Task::new();
//!         task.set_body(body);
//!         task
//!     })
//!     .response_adapter(|task: &Task| task.body().unwrap_or_default().to_string())
//!     .handler(Shout)
//!     .build()?;
//!
//! assert_eq!(router.handle("hi".into()), "HI");
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub mod check;

pub use umbrella_core as core;
pub use umbrella_framework as framework;
pub use umbrella_runtime as runtime;
pub use umbrella_transport as transport;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use umbrella::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use umbrella_runtime::{RuntimeBuilder, UmbrellaConfig, UmbrellaRuntime};

    // Pipeline
    pub use umbrella_core::{BoxedHandler, Chain, Context, Handler, Router, RouterError, Task};

    // Framework building blocks
    pub use umbrella_framework::{
        CommandRegistry, ForwardHandler, HttpClient, InboundRequest, OutboundResponse,
        SlashCommand, TaskExt, WebhookHandler,
    };

    // Gateway
    pub use umbrella_runtime::gateway::{Gateway, GatewayBuilder};

    // Logging macros
    pub use umbrella_runtime::prelude::*;
}
