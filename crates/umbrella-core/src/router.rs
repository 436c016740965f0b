//! The router façade.
//!
//! A [`Router`] turns an opaque request into an opaque response by running it
//! through a [`Chain`]:
//!
//! 1. the context factory creates a fresh [`Context`],
//! 2. the request adapter turns the request into a [`Task`],
//! 3. the chain runs one full traversal over both,
//! 4. the response adapter turns the task into the response.
//!
//! Adapters are infallible. Anything that goes wrong inside a handler is
//! recorded in the task and left for the response adapter to interpret, so
//! [`Router::handle`] itself never fails.
//!
//! # Example
//!
//! ```rust
//! use umbrella_core::{Context, Handler, Router, Task};
//!
//! struct Shout;
//!
//! impl Handler for Shout {
//!     fn execute(&self, _ctx: &mut Context, task: &mut Task) {
//!         if let Some(body) = task.get_mut::<String>("body") {
//!             *body = body.to_uppercase();
//!         }
//!     }
//! }
//!
//! let router = Router::builder()
//!     .request_adapter(|req: &str| {
//!         let mut task = Task::new();
//!         task.insert("body", req.to_string());
//!         task
//!     })
//!     .response_adapter(|task: &Task| task.get::<String>("body").cloned().unwrap_or_default())
//!     .handler(Shout)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(router.handle("hello"), "HELLO");
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{Level, span};

use crate::chain::Chain;
use crate::container::{Context, Task};
use crate::error::{RouterError, RouterResult};
use crate::handler::{BoxedHandler, Handler};

type ContextFactory = Box<dyn Fn() -> Context + Send + Sync>;
type RequestAdapter<Req> = Box<dyn Fn(Req) -> Task + Send + Sync>;
type ResponseAdapter<Resp> = Box<dyn Fn(&Task) -> Resp + Send + Sync>;

/// Drives one handler chain per request.
///
/// `Router` is immutable and `Send + Sync`; wrap it in an `Arc` to serve
/// requests from several threads at once.
pub struct Router<Req, Resp> {
    context_factory: ContextFactory,
    request_adapter: RequestAdapter<Req>,
    response_adapter: ResponseAdapter<Resp>,
    chain: Chain,
}

impl<Req, Resp> Router<Req, Resp> {
    /// Creates a router builder.
    pub fn builder() -> RouterBuilder<Req, Resp> {
        RouterBuilder::new()
    }

    /// Runs `request` through the chain and returns the adapted response.
    pub fn handle(&self, request: Req) -> Resp {
        let span = span!(Level::DEBUG, "handle", handlers = self.chain.len());
        let _enter = span.enter();

        let mut ctx = (self.context_factory)();
        let mut task = (self.request_adapter)(request);
        self.chain.run(&mut ctx, &mut task);
        (self.response_adapter)(&task)
    }

    /// The chain this router drives.
    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Number of handlers in the chain.
    pub fn handlers(&self) -> usize {
        self.chain.len()
    }
}

impl<Req, Resp> fmt::Debug for Router<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Router`].
///
/// The context factory defaults to producing an empty [`Context`]. Both
/// adapters and at least one handler are required.
pub struct RouterBuilder<Req, Resp> {
    context_factory: Option<ContextFactory>,
    request_adapter: Option<RequestAdapter<Req>>,
    response_adapter: Option<ResponseAdapter<Resp>>,
    handlers: Vec<BoxedHandler>,
}

impl<Req, Resp> RouterBuilder<Req, Resp> {
    pub fn new() -> Self {
        Self {
            context_factory: None,
            request_adapter: None,
            response_adapter: None,
            handlers: Vec::new(),
        }
    }

    /// Sets the factory that creates each request's [`Context`].
    pub fn context_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Context + Send + Sync + 'static,
    {
        self.context_factory = Some(Box::new(factory));
        self
    }

    /// Sets the adapter that turns a request into a [`Task`].
    pub fn request_adapter<F>(mut self, adapter: F) -> Self
    where
        F: Fn(Req) -> Task + Send + Sync + 'static,
    {
        self.request_adapter = Some(Box::new(adapter));
        self
    }

    /// Sets the adapter that turns the finished [`Task`] into a response.
    pub fn response_adapter<F>(mut self, adapter: F) -> Self
    where
        F: Fn(&Task) -> Resp + Send + Sync + 'static,
    {
        self.response_adapter = Some(Box::new(adapter));
        self
    }

    /// Appends a handler to the end of the chain.
    pub fn handler<H: Handler + 'static>(mut self, handler: H) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Appends an already shared handler to the end of the chain.
    pub fn boxed_handler(mut self, handler: BoxedHandler) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Appends several shared handlers, in order.
    pub fn handlers(mut self, handlers: impl IntoIterator<Item = BoxedHandler>) -> Self {
        self.handlers.extend(handlers);
        self
    }

    /// Links the handlers and builds the router.
    pub fn build(self) -> RouterResult<Router<Req, Resp>> {
        let request_adapter = self
            .request_adapter
            .ok_or(RouterError::MissingRequestAdapter)?;
        let response_adapter = self
            .response_adapter
            .ok_or(RouterError::MissingResponseAdapter)?;
        let chain = Chain::new(self.handlers)?;

        Ok(Router {
            context_factory: self
                .context_factory
                .unwrap_or_else(|| Box::new(Context::new) as ContextFactory),
            request_adapter,
            response_adapter,
            chain,
        })
    }
}

impl<Req, Resp> Default for RouterBuilder<Req, Resp> {
    fn default() -> Self {
        Self::new()
    }
}
