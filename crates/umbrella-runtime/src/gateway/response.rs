//! Request and response adapters for the gateway router.

use tracing::error;
use umbrella_core::Task;
use umbrella_framework::keys::{self, TaskError, TaskExt};
use umbrella_framework::{InboundRequest, OutboundResponse, RegistryError, SlashCommand};

use super::error::GatewayError;
use super::{COMMAND, INBOUND};

const FORBIDDEN_MSG: &str = "uh uh uh...you didn't say the magic word. (Forbidden)";
const INTERNAL_MSG: &str = "Sorry...we uh...messed up. (Internal Server Error)";

/// Turns an inbound webhook call into a task.
///
/// The raw body becomes the task body so it is forwarded verbatim. The
/// parsed command (or the parse failure) and the request itself are stored
/// alongside for the handlers.
pub fn adapt_request(request: InboundRequest) -> Task {
    let mut task = Task::new();
    task.set_body(request.body.clone());
    task.insert(COMMAND, SlashCommand::parse(&request.body));
    task.insert(INBOUND, request);
    task
}

/// Turns a finished task into the webhook reply.
///
/// The reply is always `200 OK`; failures are reported in the body.
pub fn adapt_response(task: &Task) -> OutboundResponse {
    if let Some(error) = task.error() {
        return OutboundResponse::ok(error_message(error));
    }

    let response = OutboundResponse::ok(task.body().unwrap_or_default());
    match task.get::<String>(keys::CONTENT_TYPE) {
        Some(content_type) if !content_type.is_empty() => {
            response.with_content_type(content_type.as_str())
        }
        _ => response,
    }
}

/// The user-facing text for a recorded error.
pub fn error_message(error: &TaskError) -> String {
    match error.downcast_ref::<GatewayError>() {
        Some(GatewayError::Auth(e)) if e.is_forbidden() => FORBIDDEN_MSG.to_string(),
        Some(GatewayError::Registry(
            e @ (RegistryError::CommandNotFound(_) | RegistryError::ArgsMissing),
        )) => e.to_string(),
        Some(GatewayError::Registry(RegistryError::FunctionNotFound {
            function,
            available,
        })) => format!(
            "We're embarrassed for you, but we don't know a '{function}'. Try these instead:\n'{}'",
            available.join(", ")
        ),
        _ => {
            error!(error = %error, "Request failed with an internal error");
            INTERNAL_MSG.to_string()
        }
    }
}
