//! Method registry, call context, and service-definition ergonomics.
//!
//! This crate sits between the wire-agnostic vocabulary in `polyrpc-types` and
//! the transport/task machinery in `polyrpc-net`/`polyrpc-tower`: it is where a
//! `(service, method)` name resolves to the closure that actually decodes a
//! request, runs a handler, and encodes a response, and where per-call and
//! per-connection state live.

pub mod context;
pub mod error;
pub mod registry;
pub mod service;
pub mod session;
pub mod stub;

pub use context::CallContext;
pub use error::RegistryError;
pub use registry::ServiceRegistry;
pub use service::{BuiltService, HandlerError, Service, ServiceBuilder};
pub use session::Session;
pub use stub::{stub_from_handler, MethodStub, StubFuture};
