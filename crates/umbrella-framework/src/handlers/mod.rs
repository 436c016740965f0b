//! Reusable handlers.

mod forward;

pub use forward::ForwardHandler;
