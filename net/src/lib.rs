//! Transport layer: TCP connections framed by one of the five wire
//! protocols, client-side pooling, and server-side accept backpressure.
//!
//! This crate is the only one in the workspace that touches an actual byte
//! stream; everything above it (`polyrpc-client`, `polyrpc-server`) is
//! written against [`Connection<S, P>`] so it works equally against a real
//! `TcpStream` or an in-memory `tokio::io::duplex` half.

pub mod config;
pub mod connection;
pub mod error;
pub mod listener;
pub mod pool;
pub mod protocol;

pub use config::ConnectionLimits;
pub use connection::Connection;
pub use error::TransportError;
pub use listener::{Accepted, Listener};
pub use pool::{Checkout, ConnectionPool};
pub use protocol::{
    BBinProtocol, Protocol, RpcMeta, SBinProtocol, SHttpProtocol, TBinProtocol, TrBinProtocol,
};
