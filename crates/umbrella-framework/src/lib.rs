//! # Umbrella Framework
//!
//! Building blocks that sit around the [`umbrella_core`] pipeline:
//!
//! - Well-known task and context keys plus the [`TaskExt`] accessors
//! - The [`HttpClient`] capability trait, implemented by `umbrella-transport`
//! - [`ForwardHandler`], which POSTs the task body to a URL from the context
//! - Slash-command parsing ([`SlashCommand`])
//! - The case-insensitive [`CommandRegistry`] and its cascading
//!   [`RegistryLoader`]
//! - Webhook request/response types shared by the transport and runtime

pub mod command;
pub mod error;
pub mod handlers;
pub mod keys;
pub mod registry;
pub mod transport;
pub mod webhook;

pub use command::{SlashCommand, shell_split};
pub use error::{CommandError, ForwardError, TransportError, TransportResult};
pub use handlers::ForwardHandler;
pub use keys::{TaskError, TaskExt};
pub use registry::{
    CommandRecord, CommandRegistry, FunctionRecord, FunctionTable, RegistryError, RegistryLoader,
    RegistryResult, RegistrySource,
};
pub use transport::{HttpClient, HttpResponse};
pub use webhook::{InboundRequest, OutboundResponse, WebhookHandler};
