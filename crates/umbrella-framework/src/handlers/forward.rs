//! Forwarding handler.

use std::io::Read;

use tracing::{debug, warn};
use umbrella_core::{Context, Handler, Task};

use crate::error::ForwardError;
use crate::keys::{self, TaskExt};
use crate::transport::HttpClient;

/// Forwards the task body to a downstream service.
///
/// On `execute` it reads the target URL ([`keys::REQUEST_URL`]) and content
/// type ([`keys::CONTENT_TYPE`]) from the context and POSTs the task body
/// ([`keys::BODY`]) there. On success the body is replaced by the downstream
/// payload and the downstream status code and content type are recorded in
/// the task. On failure a [`ForwardError`] is recorded and the body is left
/// untouched.
///
/// It never stops the chain from `before` and has no cleanup of its own.
pub struct ForwardHandler<C> {
    client: C,
}

impl<C: HttpClient> ForwardHandler<C> {
    /// Creates a forwarding handler using `client`.
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

impl<C: HttpClient> Handler for ForwardHandler<C> {
    fn execute(&self, ctx: &mut Context, task: &mut Task) {
        let Some(url) = ctx.get::<String>(keys::REQUEST_URL) else {
            warn!("No request url in context, nothing to forward");
            task.set_error(ForwardError::MissingUrl);
            return;
        };
        let content_type = ctx
            .get::<String>(keys::CONTENT_TYPE)
            .map(String::as_str)
            .unwrap_or_default();
        let body = task.body().unwrap_or_default().to_string();

        debug!(url = %url, content_type, len = body.len(), "Forwarding request");

        let mut response = match self.client.post(url, content_type, body) {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %url, error = %e, "Forwarding failed");
                task.set_error(ForwardError::from(e));
                return;
            }
        };

        let mut raw = Vec::new();
        if let Err(e) = response.body.read_to_end(&mut raw) {
            warn!(url = %url, error = %e, "Failed to read forwarded response");
            task.set_error(ForwardError::Read(e.to_string()));
            return;
        }
        // Functions may answer with any bytes; pass them on rather than fail.
        let payload = String::from_utf8_lossy(&raw).into_owned();

        debug!(
            url = %url,
            status = response.status,
            len = payload.len(),
            "Forwarded response received"
        );
        task.set_body(payload);
        task.insert(keys::STATUS_CODE, response.status);
        if let Some(content_type) = response.content_type {
            task.insert(keys::CONTENT_TYPE, content_type);
        }
    }

    fn name(&self) -> &str {
        "forward"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{TransportError, TransportResult};
    use crate::transport::HttpResponse;
    use parking_lot::Mutex;
    use std::io;
    use std::sync::Arc;

    const URL: &str = "https://testurl.com/";
    const BODY: &str = "Test Proxy Body";
    const CONTENT_TYPE: &str = "application/json";

    /// Reader that always fails and counts how often it was asked.
    struct FailingReader(Arc<Mutex<usize>>);

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            *self.0.lock() += 1;
            Err(io::Error::other("Reading Error"))
        }
    }

    enum Reply {
        Body(&'static str),
        Bytes(&'static [u8]),
        FailRead(Arc<Mutex<usize>>),
        FailSend,
    }

    struct FakeClient {
        reply: Reply,
        calls: Mutex<Vec<(String, String, String)>>,
    }

    impl FakeClient {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl HttpClient for FakeClient {
        fn post(
            &self,
            url: &str,
            content_type: &str,
            body: String,
        ) -> TransportResult<HttpResponse> {
            self.calls
                .lock()
                .push((url.to_string(), content_type.to_string(), body));
            match &self.reply {
                Reply::Body(text) => Ok(
                    HttpResponse::new(200, io::Cursor::new(*text)).with_content_type("text/plain"),
                ),
                Reply::Bytes(bytes) => Ok(HttpResponse::new(200, io::Cursor::new(bytes.to_vec()))),
                Reply::FailRead(reads) => {
                    Ok(HttpResponse::new(200, FailingReader(Arc::clone(reads))))
                }
                Reply::FailSend => Err(TransportError::request(url, "Post Error")),
            }
        }

        fn get(&self, url: &str) -> TransportResult<HttpResponse> {
            Err(TransportError::request(url, "unused"))
        }
    }

    fn context() -> Context {
        let mut ctx = Context::new();
        ctx.insert(keys::REQUEST_URL, URL.to_string());
        ctx.insert(keys::CONTENT_TYPE, CONTENT_TYPE.to_string());
        ctx
    }

    #[test]
    fn test_forward_success() {
        let client = Arc::new(FakeClient::new(Reply::Body("Http Client Response")));
        let handler = ForwardHandler::new(Arc::clone(&client));
        let mut ctx = context();
        let mut task = Task::new();
        task.set_body(BODY);

        assert!(!handler.before(&mut ctx, &mut task));
        handler.execute(&mut ctx, &mut task);

        assert_eq!(task.body(), Some("Http Client Response"));
        assert!(task.error().is_none());
        assert_eq!(task.status_code(), Some(200));
        assert_eq!(
            task.get::<String>(keys::CONTENT_TYPE).map(String::as_str),
            Some("text/plain")
        );
        assert_eq!(
            *client.calls.lock(),
            vec![(URL.to_string(), CONTENT_TYPE.to_string(), BODY.to_string())]
        );
        // Context is only read.
        assert_eq!(ctx.get::<String>(keys::REQUEST_URL).map(String::as_str), Some(URL));
    }

    #[test]
    fn test_forward_post_error() {
        let client = Arc::new(FakeClient::new(Reply::FailSend));
        let handler = ForwardHandler::new(Arc::clone(&client));
        let mut ctx = context();
        let mut task = Task::new();

        handler.execute(&mut ctx, &mut task);

        assert!(task.body().is_none());
        assert!(matches!(
            task.error_as::<ForwardError>(),
            Some(ForwardError::Transport(TransportError::Request { .. }))
        ));
        assert_eq!(client.calls.lock().len(), 1);
    }

    #[test]
    fn test_forward_read_error() {
        let reads = Arc::new(Mutex::new(0));
        let client = Arc::new(FakeClient::new(Reply::FailRead(Arc::clone(&reads))));
        let handler = ForwardHandler::new(Arc::clone(&client));
        let mut ctx = context();
        let mut task = Task::new();
        task.set_body(BODY);

        handler.execute(&mut ctx, &mut task);

        assert_eq!(task.body(), Some(BODY));
        assert!(matches!(
            task.error_as::<ForwardError>(),
            Some(ForwardError::Read(reason)) if reason.contains("Reading Error")
        ));
        assert!(task.status_code().is_none());
        assert_eq!(client.calls.lock().len(), 1);
        assert!(*reads.lock() >= 1);
    }

    #[test]
    fn test_forward_non_utf8_reply() {
        let client = Arc::new(FakeClient::new(Reply::Bytes(&[0xff, 0xfe])));
        let handler = ForwardHandler::new(Arc::clone(&client));
        let mut ctx = context();
        let mut task = Task::new();
        task.set_body(BODY);

        handler.execute(&mut ctx, &mut task);

        assert!(task.error().is_none());
        assert_eq!(task.body(), Some("\u{FFFD}\u{FFFD}"));
        assert_eq!(task.status_code(), Some(200));
        assert!(task.get::<String>(keys::CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_forward_missing_url() {
        let client = Arc::new(FakeClient::new(Reply::Body("unused")));
        let handler = ForwardHandler::new(Arc::clone(&client));
        let mut ctx = Context::new();
        ctx.insert(keys::CONTENT_TYPE, CONTENT_TYPE.to_string());
        let mut task = Task::new();

        handler.execute(&mut ctx, &mut task);

        assert!(task.body().is_none());
        assert_eq!(task.error_as::<ForwardError>(), Some(&ForwardError::MissingUrl));
        assert!(client.calls.lock().is_empty());
    }
}
