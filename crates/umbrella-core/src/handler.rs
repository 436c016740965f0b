//! The handler contract.
//!
//! A [`Handler`] participates in a request through three phases, driven by
//! the [`Chain`](crate::chain::Chain):
//!
//! - `before` runs on the way in. Returning `true` stops forward progress and
//!   makes this handler the terminal one for the request.
//! - `execute` runs on the terminal handler only, exactly once.
//! - `after` runs on the way out, on the terminal handler and every handler
//!   before it, in reverse order.
//!
//! A handler with no opinion on stopping leaves `before` at its default and
//! puts its work in `execute`. Cleanup that must happen regardless of what
//! ran downstream belongs in `after`.
//!
//! # Example
//!
//! ```rust
//! use umbrella_core::{Context, Handler, Task};
//!
//! struct RequireBody;
//!
//! impl Handler for RequireBody {
//!     fn before(&self, _ctx: &mut Context, task: &mut Task) -> bool {
//!         // Stop here when there is nothing to forward.
//!         !task.contains_key("body")
//!     }
//!
//!     fn execute(&self, _ctx: &mut Context, task: &mut Task) {
//!         task.insert("body", "nothing to do".to_string());
//!     }
//! }
//! ```

use std::sync::Arc;

use crate::container::{Context, Task};

/// A unit of business logic in a handler chain.
///
/// One handler instance serves every request that goes through its chain, so
/// implementations must be reentrant: either immutable or synchronized
/// internally.
pub trait Handler: Send + Sync {
    /// Forward phase. Return `true` to become the terminal handler.
    fn before(&self, _ctx: &mut Context, _task: &mut Task) -> bool {
        false
    }

    /// Primary work, invoked on the terminal handler only.
    fn execute(&self, _ctx: &mut Context, _task: &mut Task) {}

    /// Cleanup, invoked on the way back from the terminal handler.
    fn after(&self, _ctx: &mut Context, _task: &mut Task) {}

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// A shared, type-erased handler as stored in a chain.
pub type BoxedHandler = Arc<dyn Handler>;

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn before(&self, ctx: &mut Context, task: &mut Task) -> bool {
        (**self).before(ctx, task)
    }

    fn execute(&self, ctx: &mut Context, task: &mut Task) {
        (**self).execute(ctx, task)
    }

    fn after(&self, ctx: &mut Context, task: &mut Task) {
        (**self).after(ctx, task)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
