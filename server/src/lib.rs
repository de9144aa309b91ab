//! Server-side framework: accepts connections, dispatches requests to
//! registered handlers, and replies, across any of the five wire protocols.
//!
//! [`RpcServer<P>`](facade::RpcServer) is the public entry point; [`dispatch`]
//! and [`connection`] are its internals, exposed so other crates in this
//! workspace can drive them directly in tests without a real socket.

pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod facade;

pub use config::ServerConfig;
pub use dispatch::dispatch;
pub use error::ServerError;
pub use facade::RpcServer;
