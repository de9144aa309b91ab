//! One module per wire protocol.
//!
//! [`meta`] holds the schema-A binary meta record shared by [`s_bin`], [`b_bin`],
//! and [`tr_bin`]. [`t_bin`] and [`s_http`] carry their own meta shapes (a Thrift
//! envelope and an HTTP/1.1 request/response respectively) since neither reuses
//! the schema-A record.

pub mod b_bin;
pub mod meta;
pub mod s_bin;
pub mod s_http;
pub mod t_bin;
pub mod tr_bin;

pub use b_bin::BBin;
pub use meta::CommonMeta;
pub use s_bin::SBin;
pub use s_http::{SHttp, SHttpMeta};
pub use t_bin::{TBin, ThriftMessageType, ThriftMeta};
pub use tr_bin::{TrBin, TrBinMeta};
