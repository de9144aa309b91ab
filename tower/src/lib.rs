//! The task/filter pipeline: the per-call execution graph. A call is a
//! series of subtasks (begin-filters → transport → end-filters) that can
//! suspend at I/O boundaries, be cancelled, and carry module-data across
//! hops.
//!
//! This crate only models the *shape* of that pipeline; it is generic over
//! the transport subtask (typically a [`tower_service::Service`] supplied by
//! `polyrpc-net`) and carries no protocol-specific knowledge.

pub mod cancel;
pub mod chain;
pub mod filter;
pub mod series;
pub mod service;
pub mod timeouts;
pub mod tracing_filter;

pub use cancel::CancelToken;
pub use chain::{BeginOutcome, FilterChain};
pub use filter::{BoxFuture, Filter};
pub use series::{Series, Subtask};
pub use service::{FilterLayer, FilterService};
pub use timeouts::CallTimeouts;
pub use tracing_filter::TracingFilter;
