//! Gateway handlers.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};
use umbrella_core::{Context, Handler, Task};
use umbrella_framework::keys::{self, TaskExt};
use umbrella_framework::{CommandRegistry, InboundRequest, SlashCommand};
use url::Url;

use super::error::GatewayError;
use super::{COMMAND, INBOUND, ParsedCommand, STARTED_AT};
use crate::auth::SignatureVerifier;

// =============================================================================
// Request Log
// =============================================================================

/// Logs the outcome and duration of every request.
///
/// Sits first in the chain so its `after` runs last, once every other
/// handler has finished.
#[derive(Debug, Default)]
pub struct RequestLogHandler;

impl Handler for RequestLogHandler {
    fn before(&self, ctx: &mut Context, _task: &mut Task) -> bool {
        ctx.insert(STARTED_AT, Instant::now());
        false
    }

    fn after(&self, ctx: &mut Context, task: &mut Task) {
        let elapsed_ms = ctx
            .get::<Instant>(STARTED_AT)
            .map(|started| started.elapsed().as_millis() as u64)
            .unwrap_or_default();
        let command = task
            .get::<ParsedCommand>(COMMAND)
            .and_then(|parsed| parsed.as_ref().ok())
            .map(|cmd| cmd.command.as_str())
            .unwrap_or("-");

        match task.error() {
            Some(error) => warn!(command, elapsed_ms, error = %error, "Request failed"),
            None => info!(
                command,
                elapsed_ms,
                status = ?task.status_code(),
                "Request handled"
            ),
        }
    }

    fn name(&self) -> &str {
        "request-log"
    }
}

// =============================================================================
// Authenticate
// =============================================================================

/// Rejects requests whose signature does not verify.
///
/// Without a verifier every request passes.
#[derive(Debug, Default)]
pub struct AuthenticateHandler {
    verifier: Option<SignatureVerifier>,
}

impl AuthenticateHandler {
    pub fn new(verifier: Option<SignatureVerifier>) -> Self {
        Self { verifier }
    }
}

impl Handler for AuthenticateHandler {
    fn before(&self, _ctx: &mut Context, task: &mut Task) -> bool {
        let Some(verifier) = &self.verifier else {
            return false;
        };

        let result = match task.get::<InboundRequest>(INBOUND) {
            Some(request) => verifier.verify(request),
            None => {
                task.set_error(GatewayError::MissingRequest);
                return true;
            }
        };

        match result {
            Ok(()) => {
                debug!("Request signature verified");
                false
            }
            Err(e) => {
                warn!(error = %e, forbidden = e.is_forbidden(), "Request authentication failed");
                task.set_error(GatewayError::Auth(e));
                true
            }
        }
    }

    fn name(&self) -> &str {
        "authenticate"
    }
}

// =============================================================================
// Resolve Endpoint
// =============================================================================

/// Resolves the slash command to a downstream URL.
///
/// On success the URL and content type are written to the context for the
/// forwarding handler. Reserved keywords are answered directly with the
/// command's usage listing; lookup failures are recorded and stop the chain.
pub struct ResolveEndpointHandler {
    registry: Arc<CommandRegistry>,
    root: Url,
    content_type: Option<String>,
}

impl ResolveEndpointHandler {
    pub fn new(registry: Arc<CommandRegistry>, root: Url, content_type: Option<String>) -> Self {
        Self {
            registry,
            root,
            content_type,
        }
    }

    /// Appends `function` to the root URL's path.
    pub fn endpoint(&self, function: &str) -> Result<Url, GatewayError> {
        let mut url = self.root.clone();
        {
            let mut segments =
                url.path_segments_mut()
                    .map_err(|()| GatewayError::InvalidEndpoint {
                        root: self.root.to_string(),
                        function: function.to_string(),
                    })?;
            segments.pop_if_empty().push(function);
        }
        Ok(url)
    }

    fn resolve(
        &self,
        command: &SlashCommand,
        task: &mut Task,
    ) -> Result<Option<Url>, GatewayError> {
        if let Some(function) = command.function()
            && self
                .registry
                .command(&command.command)
                .is_some_and(|record| record.is_reserved(function))
        {
            debug!(command = %command.command, keyword = function, "Answering reserved keyword");
            task.set_body(self.registry.usage(&command.command)?);
            return Ok(None);
        }

        self.registry
            .function_record(&command.command, &command.arguments)?;

        // function_record succeeded, so there is a first argument
        let function = command.function().unwrap_or_default().to_lowercase();
        self.endpoint(&function).map(Some)
    }
}

impl Handler for ResolveEndpointHandler {
    fn before(&self, ctx: &mut Context, task: &mut Task) -> bool {
        let command = match task.get::<ParsedCommand>(COMMAND).cloned() {
            Some(Ok(command)) => command,
            Some(Err(e)) => {
                task.set_error(GatewayError::Command(e));
                return true;
            }
            None => {
                task.set_error(GatewayError::MissingRequest);
                return true;
            }
        };

        let url = match self.resolve(&command, task) {
            Ok(Some(url)) => url,
            Ok(None) => return true,
            Err(e) => {
                debug!(command = %command.command, error = %e, "Command not resolved");
                task.set_error(e);
                return true;
            }
        };

        let content_type = self
            .content_type
            .clone()
            .or_else(|| {
                task.get::<InboundRequest>(INBOUND)
                    .and_then(|request| request.header("content-type"))
                    .map(str::to_string)
            })
            .unwrap_or_default();

        debug!(command = %command.command, url = %url, "Resolved endpoint");
        ctx.insert(keys::REQUEST_URL, url.to_string());
        ctx.insert(keys::CONTENT_TYPE, content_type);
        false
    }

    fn name(&self) -> &str {
        "resolve-endpoint"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler(root: &str) -> ResolveEndpointHandler {
        ResolveEndpointHandler::new(
            Arc::new(CommandRegistry::default()),
            Url::parse(root).unwrap(),
            None,
        )
    }

    #[test]
    fn test_endpoint_joins_path() {
        assert_eq!(
            handler("https://functions.example.com/api")
                .endpoint("deploy")
                .unwrap()
                .as_str(),
            "https://functions.example.com/api/deploy"
        );
        assert_eq!(
            handler("https://functions.example.com/api/")
                .endpoint("deploy")
                .unwrap()
                .as_str(),
            "https://functions.example.com/api/deploy"
        );
        assert_eq!(
            handler("https://functions.example.com")
                .endpoint("deploy")
                .unwrap()
                .as_str(),
            "https://functions.example.com/deploy"
        );
    }

    #[test]
    fn test_endpoint_escapes_segment() {
        assert_eq!(
            handler("https://functions.example.com/api")
                .endpoint("../admin")
                .unwrap()
                .as_str(),
            "https://functions.example.com/api/..%2Fadmin"
        );
    }

    #[test]
    fn test_endpoint_rejects_non_base_root() {
        assert!(matches!(
            handler("mailto:ops@example.com").endpoint("deploy"),
            Err(GatewayError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_request_log_records_start() {
        let mut ctx = Context::new();
        let mut task = Task::new();
        assert!(!RequestLogHandler.before(&mut ctx, &mut task));
        assert!(ctx.contains_key(STARTED_AT));
        RequestLogHandler.after(&mut ctx, &mut task);
    }

    #[test]
    fn test_authenticate_without_verifier_passes() {
        let handler = AuthenticateHandler::new(None);
        let mut ctx = Context::new();
        let mut task = Task::new();
        assert!(!handler.before(&mut ctx, &mut task));
        assert!(task.error().is_none());
    }

    #[test]
    fn test_authenticate_without_request_stops() {
        let handler = AuthenticateHandler::new(Some(SignatureVerifier::new(
            "secret",
            std::time::Duration::from_secs(300),
        )));
        let mut ctx = Context::new();
        let mut task = Task::new();
        assert!(handler.before(&mut ctx, &mut task));
        assert_eq!(
            task.error_as::<GatewayError>(),
            Some(&GatewayError::MissingRequest)
        );
    }
}
