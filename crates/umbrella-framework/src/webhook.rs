//! Webhook request and response types.
//!
//! These are the values a [`Router`] sees when it sits behind the webhook
//! listener: the listener converts the HTTP request into an
//! [`InboundRequest`], hands it to a [`WebhookHandler`] and writes the
//! returned [`OutboundResponse`] back.

use std::collections::HashMap;

use umbrella_core::Router;

/// An inbound webhook call.
///
/// Header names are stored lowercased and looked up case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundRequest {
    headers: HashMap<String, String>,
    /// Request body as text.
    pub body: String,
    /// Bytes as received, kept only when they are not valid UTF-8.
    raw: Option<Vec<u8>>,
}

impl InboundRequest {
    /// Creates a request with the given body and no headers.
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            headers: HashMap::new(),
            body: body.into(),
            raw: None,
        }
    }

    /// Creates a request from the bytes received on the wire.
    ///
    /// Invalid UTF-8 is replaced in [`body`](Self::body), while
    /// [`raw_body`](Self::raw_body) still returns the original bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        match String::from_utf8(bytes.into()) {
            Ok(body) => Self::new(body),
            Err(e) => {
                let raw = e.into_bytes();
                let mut request = Self::new(String::from_utf8_lossy(&raw).into_owned());
                request.raw = Some(raw);
                request
            }
        }
    }

    /// The body exactly as received.
    pub fn raw_body(&self) -> &[u8] {
        self.raw.as_deref().unwrap_or(self.body.as_bytes())
    }

    /// Adds a header, replacing any previous value.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert_header(name, value);
        self
    }

    /// Sets a header, replacing any previous value.
    pub fn insert_header(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Returns a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// All headers, with lowercased names.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }
}

/// The response written back to the webhook caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundResponse {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

impl OutboundResponse {
    /// A `200 OK` plain-text response.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: "text/plain; charset=utf-8".to_string(),
            body: body.into(),
        }
    }

    /// Replaces the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

/// Something that answers webhook calls synchronously.
///
/// Implementations run on a blocking thread, so they may do blocking I/O.
pub trait WebhookHandler: Send + Sync + 'static {
    fn handle(&self, request: InboundRequest) -> OutboundResponse;
}

impl WebhookHandler for Router<InboundRequest, OutboundResponse> {
    fn handle(&self, request: InboundRequest) -> OutboundResponse {
        Router::handle(self, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::TaskExt;
    use umbrella_core::{Context, Handler, Task};

    #[test]
    fn test_headers_case_insensitive() {
        let request = InboundRequest::new("body")
            .with_header("X-Slack-Signature", "v0=abc")
            .with_header("x-slack-signature", "v0=def");
        assert_eq!(request.header("X-SLACK-SIGNATURE"), Some("v0=def"));
        assert_eq!(request.headers().len(), 1);
        assert!(request.header("missing").is_none());
    }

    #[test]
    fn test_from_bytes_keeps_raw_body() {
        let request = InboundRequest::from_bytes(b"text=caf\xe9".to_vec());
        assert_eq!(request.body, "text=caf\u{FFFD}");
        assert_eq!(request.raw_body(), b"text=caf\xe9");

        let request = InboundRequest::from_bytes("text=café");
        assert_eq!(request, InboundRequest::new("text=café"));
        assert_eq!(request.raw_body(), "text=café".as_bytes());
    }

    struct Echo;

    impl Handler for Echo {
        fn execute(&self, _ctx: &mut Context, task: &mut Task) {
            let reply = format!("echo: {}", task.body().unwrap_or_default());
            task.set_body(reply);
        }
    }

    #[test]
    fn test_router_as_webhook_handler() {
        let router: Router<InboundRequest, OutboundResponse> = Router::builder()
            .request_adapter(|req: InboundRequest| {
                let mut task = Task::new();
                task.set_body(req.body);
                task
            })
            .response_adapter(|task: &Task| OutboundResponse::ok(task.body().unwrap_or_default()))
            .handler(Echo)
            .build()
            .unwrap();

        let handler: &dyn WebhookHandler = &router;
        let response = handler.handle(InboundRequest::new("hi"));
        assert_eq!(response, OutboundResponse::ok("echo: hi"));
    }
}
