//! HTTP client capability.
//!
//! Handlers and the registry loader talk HTTP through the [`HttpClient`]
//! trait rather than a concrete client. `umbrella-transport` provides the
//! reqwest-backed implementation; tests provide fakes.
//!
//! The trait is synchronous on purpose: it is called from inside a handler
//! chain traversal, which never suspends.

use std::fmt;
use std::io::Read;
use std::sync::Arc;

use crate::error::TransportResult;

/// A response whose body has not been read yet.
///
/// Reading the body is a separate step from sending the request so callers
/// can tell a transport failure from a failure to read the payload.
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Value of the `content-type` header, if present.
    pub content_type: Option<String>,
    /// Unread response body.
    pub body: Box<dyn Read + Send>,
}

impl HttpResponse {
    /// Creates a response with the given status and body.
    pub fn new(status: u16, body: impl Read + Send + 'static) -> Self {
        Self {
            status,
            content_type: None,
            body: Box::new(body),
        }
    }

    /// Sets the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Reads the whole body as text.
    ///
    /// Invalid UTF-8 sequences are replaced with `U+FFFD`; only I/O failures
    /// are errors.
    pub fn text(mut self) -> std::io::Result<String> {
        let mut raw = Vec::new();
        self.body.read_to_end(&mut raw)?;
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Blocking HTTP client capability.
pub trait HttpClient: Send + Sync {
    /// POSTs `body` to `url` with the given content type.
    ///
    /// An empty `content_type` sends no content-type header. Any status code
    /// is returned as a response; only failures to get a response are errors.
    fn post(&self, url: &str, content_type: &str, body: String) -> TransportResult<HttpResponse>;

    /// GETs `url`.
    fn get(&self, url: &str) -> TransportResult<HttpResponse>;
}

impl<C: HttpClient + ?Sized> HttpClient for Arc<C> {
    fn post(&self, url: &str, content_type: &str, body: String) -> TransportResult<HttpResponse> {
        (**self).post(url, content_type, body)
    }

    fn get(&self, url: &str) -> TransportResult<HttpResponse> {
        (**self).get(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    struct BrokenPipe;

    impl Read for BrokenPipe {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    #[test]
    fn test_text_utf8() {
        let response = HttpResponse::new(200, Cursor::new("héllo"));
        assert_eq!(response.text().unwrap(), "héllo");
    }

    #[test]
    fn test_text_replaces_invalid_utf8() {
        let response = HttpResponse::new(200, Cursor::new(vec![b'o', b'k', 0xff]));
        assert_eq!(response.text().unwrap(), "ok\u{FFFD}");
    }

    #[test]
    fn test_text_io_error() {
        let err = HttpResponse::new(200, BrokenPipe).text().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_is_success() {
        assert!(HttpResponse::new(204, io::empty()).is_success());
        assert!(!HttpResponse::new(302, io::empty()).is_success());
        assert!(!HttpResponse::new(500, io::empty()).is_success());
    }
}
