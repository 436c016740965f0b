//! Webhook listener.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace};

use umbrella_framework::{InboundRequest, TransportError, TransportResult, WebhookHandler};

type SharedHandler = Arc<dyn WebhookHandler>;

/// Builds the axum router that serves `handler` on `path`.
///
/// Only `POST` is routed. Each call runs the handler on the blocking thread
/// pool and answers with whatever status, content type and body it returns.
pub fn webhook_router(path: &str, handler: SharedHandler) -> Router {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };

    Router::new()
        .route(&path, post(webhook))
        .with_state(handler)
}

/// Binds `addr` and serves `handler` on `path` in a background task.
///
/// The listener runs until the returned handle is shut down or dropped.
pub async fn listen(
    addr: &str,
    path: &str,
    handler: SharedHandler,
) -> TransportResult<ListenerHandle> {
    let router = webhook_router(path, handler);

    let bind_error = |e: std::io::Error| TransportError::Bind {
        addr: addr.to_string(),
        reason: e.to_string(),
    };
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(bind_error)?;
    let local_addr = listener.local_addr().map_err(bind_error)?;

    info!(addr = %local_addr, path = %path, "Webhook listener started");

    let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

    let task = tokio::spawn(async move {
        let server = axum::serve(listener, router);

        tokio::select! {
            result = server => {
                if let Err(e) = result {
                    error!(error = %e, "Webhook listener error");
                }
            }
            _ = &mut shutdown_rx => {
                info!("Webhook listener shutting down");
            }
        }
    });

    Ok(ListenerHandle {
        id: format!("http-webhook-{local_addr}"),
        local_addr,
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    })
}

/// Handle to a running webhook listener.
#[derive(Debug)]
pub struct ListenerHandle {
    /// Unique identifier for this listener.
    pub id: String,
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ListenerHandle {
    /// The address actually bound, useful when listening on port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Signals the listener to stop and waits for its task to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!(id = %self.id, error = %e, "Webhook listener task failed");
            }
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// HTTP POST handler.
async fn webhook(
    State(handler): State<SharedHandler>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    trace!(len = body.len(), "Received webhook call");

    // Signatures are checked against the bytes as received.
    let mut request = InboundRequest::from_bytes(body.to_vec());
    for (name, value) in &headers {
        match value.to_str() {
            Ok(value) => request.insert_header(name.as_str(), value),
            Err(_) => trace!(header = %name, "Skipping non-text header"),
        }
    }

    let response = match tokio::task::spawn_blocking(move || handler.handle(request)).await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "Webhook handler did not complete");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    debug!(
        status = response.status,
        len = response.body.len(),
        "Webhook call handled"
    );

    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::OK);
    (status, [(header::CONTENT_TYPE, response.content_type)], response.body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;
    use umbrella_framework::OutboundResponse;

    /// Echoes the signature header and body.
    struct Echo;

    impl WebhookHandler for Echo {
        fn handle(&self, request: InboundRequest) -> OutboundResponse {
            let signature = request.header("x-slack-signature").unwrap_or("none");
            OutboundResponse::ok(format!("{signature}|{}", request.body))
                .with_content_type("application/json")
        }
    }

    fn echo() -> SharedHandler {
        Arc::new(Echo)
    }

    /// Reports the body length as received.
    struct RawLen;

    impl WebhookHandler for RawLen {
        fn handle(&self, request: InboundRequest) -> OutboundResponse {
            OutboundResponse::ok(format!("{}|{}", request.raw_body().len(), request.body))
        }
    }

    struct Panics;

    impl WebhookHandler for Panics {
        fn handle(&self, _request: InboundRequest) -> OutboundResponse {
            panic!("handler exploded");
        }
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_post_reaches_handler() {
        let app = webhook_router("slack", echo());
        let request = Request::builder()
            .method("POST")
            .uri("/slack")
            .header("X-Slack-Signature", "v0=abc")
            .body(Body::from("command=%2Fumbrella"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(body_text(response).await, "v0=abc|command=%2Fumbrella");
    }

    #[tokio::test]
    async fn test_non_utf8_body_reaches_handler_intact() {
        let app = webhook_router("/slack", Arc::new(RawLen));
        let request = Request::builder()
            .method("POST")
            .uri("/slack")
            .body(Body::from(vec![b'a', 0xff, b'b']))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "3|a\u{FFFD}b");
    }

    #[tokio::test]
    async fn test_only_post_is_routed() {
        let app = webhook_router("/slack", echo());

        let get = Request::builder().uri("/slack").body(Body::empty()).unwrap();
        let response = app.clone().oneshot(get).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let other = Request::builder()
            .method("POST")
            .uri("/other")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(other).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_panicking_handler_is_internal_error() {
        let app = webhook_router("/", Arc::new(Panics));
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_listen_and_shutdown() {
        let handle = listen("127.0.0.1:0", "/", echo()).await.unwrap();
        assert_ne!(handle.local_addr().port(), 0);
        assert!(handle.id.starts_with("http-webhook-"));
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_listen_bad_address() {
        let err = listen("not an address", "/", echo()).await.unwrap_err();
        assert!(matches!(err, TransportError::Bind { .. }));
    }
}
