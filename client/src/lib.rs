//! Client-side framework: builds and runs typed calls against a remote
//! service over any of the five wire protocols.
//!
//! [`RpcClient<P>`](facade::RpcClient) is the public entry point;
//! [`ClientTask`](task::ClientTask) is the one-call builder it hands out.
//! Both are generic over a [`polyrpc_net::Protocol`], the same parameter
//! `polyrpc-server`'s `RpcServer` takes, so a service can be exercised over
//! every protocol without duplicated glue.

pub mod codec;
pub mod config;
pub mod error;
pub mod facade;
pub mod task;

pub use codec::{codec_decoder, codec_encoder};
pub use config::ClientConfig;
pub use error::ClientError;
pub use facade::RpcClient;
pub use task::{ClientCallOutcome, ClientCallResult, ClientTask};
