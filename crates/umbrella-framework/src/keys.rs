//! Well-known keys shared by handlers and adapters.
//!
//! The core containers accept any key; these are the ones the framework's
//! handlers and the gateway agree on.

use std::error::Error;
use std::sync::Arc;

use umbrella_core::Task;

/// Task: request payload, replaced by the downstream response on success.
pub const BODY: &str = "body";

/// Task: a [`TaskError`] recorded by a handler.
pub const ERROR: &str = "error";

/// Task: HTTP status code (`u16`) reported by the downstream service.
pub const STATUS_CODE: &str = "status-code";

/// Context: target URL (`String`) for forwarding.
/// Task: not used.
pub const REQUEST_URL: &str = "request-url";

/// Context: content type (`String`) of the forwarded request.
/// Task: content type (`String`) of the downstream response.
pub const CONTENT_TYPE: &str = "content-type";

/// An error recorded in a task.
///
/// Stored behind an `Arc` so response adapters can inspect it by reference
/// and downcast it to a concrete type.
pub type TaskError = Arc<dyn Error + Send + Sync>;

/// Typed accessors for the well-known task keys.
pub trait TaskExt {
    /// The current body, if it is a string.
    fn body(&self) -> Option<&str>;

    /// Replaces the body.
    fn set_body(&mut self, body: impl Into<String>);

    /// The recorded error, if any.
    fn error(&self) -> Option<&TaskError>;

    /// Records `err`, replacing any earlier error.
    fn set_error<E: Error + Send + Sync + 'static>(&mut self, err: E);

    /// The recorded error, if it is an `E`.
    fn error_as<E: Error + 'static>(&self) -> Option<&E>;

    /// The downstream status code, if one was recorded.
    fn status_code(&self) -> Option<u16>;
}

impl TaskExt for Task {
    fn body(&self) -> Option<&str> {
        self.get::<String>(BODY).map(String::as_str)
    }

    fn set_body(&mut self, body: impl Into<String>) {
        self.insert(BODY, body.into());
    }

    fn error(&self) -> Option<&TaskError> {
        self.get::<TaskError>(ERROR)
    }

    fn set_error<E: Error + Send + Sync + 'static>(&mut self, err: E) {
        self.insert(ERROR, Arc::new(err) as TaskError);
    }

    fn error_as<E: Error + 'static>(&self) -> Option<&E> {
        self.error().and_then(|e| e.downcast_ref::<E>())
    }

    fn status_code(&self) -> Option<u16> {
        self.get::<u16>(STATUS_CODE).copied()
    }
}
