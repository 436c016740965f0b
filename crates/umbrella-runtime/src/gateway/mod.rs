//! The webhook gateway.
//!
//! A [`Gateway`] is a [`Router`] over [`InboundRequest`]s with this chain:
//!
//! ```text
//! RequestLog ─▶ Authenticate ─▶ ResolveEndpoint ─▶ Forward
//! ```
//!
//! Authentication and resolution stop the chain early when a request is
//! rejected or answered locally (reserved keywords such as `help`). Every
//! reply is `200 OK`; failures are described in the body.

mod error;
mod handlers;
mod response;

use std::sync::Arc;

use umbrella_core::Router;
use umbrella_framework::{
    CommandError, CommandRegistry, ForwardHandler, HttpClient, InboundRequest, OutboundResponse,
    SlashCommand,
};
use url::Url;

use crate::auth::SignatureVerifier;

pub use error::{GatewayError, GatewayResult};
pub use handlers::{AuthenticateHandler, RequestLogHandler, ResolveEndpointHandler};
pub use response::{adapt_request, adapt_response, error_message};

/// Task key holding the [`InboundRequest`].
pub const INBOUND: &str = "inbound-request";
/// Task key holding the [`ParsedCommand`].
pub const COMMAND: &str = "command";
/// Context key holding the request start `Instant`.
pub const STARTED_AT: &str = "started-at";

/// The slash command parsed from the request body, or why it failed.
pub type ParsedCommand = Result<SlashCommand, CommandError>;

/// The webhook router.
pub type Gateway = Router<InboundRequest, OutboundResponse>;

/// Builder for [`Gateway`].
pub struct GatewayBuilder {
    root: Url,
    registry: Arc<CommandRegistry>,
    client: Arc<dyn HttpClient>,
    verifier: Option<SignatureVerifier>,
    content_type: Option<String>,
}

impl GatewayBuilder {
    /// Starts a gateway forwarding to functions under `root`.
    pub fn new(root: Url, registry: Arc<CommandRegistry>, client: Arc<dyn HttpClient>) -> Self {
        Self {
            root,
            registry,
            client,
            verifier: None,
            content_type: None,
        }
    }

    /// Requires requests to carry a valid signature.
    pub fn verifier(mut self, verifier: SignatureVerifier) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Content type sent downstream instead of the inbound one.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn build(self) -> GatewayResult<Gateway> {
        let router = Router::builder()
            .request_adapter(adapt_request)
            .response_adapter(adapt_response)
            .handler(RequestLogHandler)
            .handler(AuthenticateHandler::new(self.verifier))
            .handler(ResolveEndpointHandler::new(
                self.registry,
                self.root,
                self.content_type,
            ))
            .handler(ForwardHandler::new(self.client))
            .build()?;
        Ok(router)
    }
}
