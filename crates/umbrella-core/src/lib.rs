//! # Umbrella Core
//!
//! The middleware pipeline at the heart of the Umbrella request router.
//!
//! A [`Router`] drives an ordered chain of [`Handler`]s over two per-request
//! containers, a [`Context`] and a [`Task`]. Every handler can veto further
//! progress from its `before` phase; exactly one handler executes; and every
//! handler that was entered gets its `after` phase, in reverse order.
//!
//! ```text
//! request ─▶ request adapter ─▶ Task ─┐
//!           context factory ─▶ Context ┤
//!                                      ▼
//!             ┌────────┐   ┌────────┐   ┌────────┐
//!   before ─▶ │   H1   │─▶ │   H2   │─▶ │   H3   │
//!             └────────┘   └────────┘   └────────┘
//!   after  ◀──────────────── (terminal) execute
//!                                      │
//! response ◀─ response adapter ◀─ Task ┘
//! ```
//!
//! The traversal is fully synchronous. Handler failures are not propagated as
//! Rust errors: handlers record them in the task, and the response adapter
//! decides what to make of them.

pub mod chain;
pub mod container;
pub mod error;
pub mod handler;
pub mod router;

pub use chain::{Chain, Node};
pub use container::{Context, Store, Task};
pub use error::{RouterError, RouterResult};
pub use handler::{BoxedHandler, Handler};
pub use router::{Router, RouterBuilder};
