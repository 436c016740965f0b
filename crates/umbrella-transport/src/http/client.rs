//! Blocking HTTP client implementation.

use std::time::Duration;

use reqwest::blocking::{Client, ClientBuilder, RequestBuilder};
use reqwest::header::CONTENT_TYPE;
use tracing::trace;

use umbrella_framework::{HttpClient, HttpResponse, TransportError, TransportResult};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// [`HttpClient`] backed by reqwest's blocking client.
///
/// The blocking client runs its own internal runtime, so it must be created,
/// used and dropped outside of any async context. The webhook listener calls
/// handlers on the blocking pool for this reason.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    /// Creates a client with the default timeout.
    pub fn new() -> TransportResult<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a client whose requests fail after `timeout`.
    pub fn with_timeout(timeout: Duration) -> TransportResult<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::InvalidConfig(e.to_string()))?;

        Ok(Self { client })
    }

    fn send(&self, url: &str, request: RequestBuilder) -> TransportResult<HttpResponse> {
        let response = request
            .send()
            .map_err(|e| TransportError::request(url, e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        trace!(url, status, content_type = ?content_type, "HTTP response received");

        let mut response = HttpResponse::new(status, response);
        response.content_type = content_type;
        Ok(response)
    }
}

impl HttpClient for ReqwestClient {
    fn post(&self, url: &str, content_type: &str, body: String) -> TransportResult<HttpResponse> {
        trace!(url, content_type, len = body.len(), "HTTP POST");
        let mut request = self.client.post(url).body(body);
        if !content_type.is_empty() {
            request = request.header(CONTENT_TYPE, content_type);
        }
        self.send(url, request)
    }

    fn get(&self, url: &str) -> TransportResult<HttpResponse> {
        trace!(url, "HTTP GET");
        self.send(url, self.client.get(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_is_request_error() {
        let client = ReqwestClient::new().unwrap();
        let err = client.post("not a url", "text/plain", "body".into()).unwrap_err();
        assert!(matches!(err, TransportError::Request { url, .. } if url == "not a url"));
    }
}
