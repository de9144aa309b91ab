//! The payload pipeline: pluggable serialization and compression.
//!
//! Outbound: [`serialize::encode`] then [`compress::compress`]. Inbound:
//! [`compress::decompress`] then [`serialize::decode`]. Each half is
//! identified by a tag ([`polyrpc_types::DataType`] /
//! [`polyrpc_types::CompressType`]) carried in the caller's meta, never
//! inferred from the bytes themselves — decoding is meta-driven.

pub mod compress;
pub mod error;
pub mod serialize;
pub mod threshold;

pub use error::{CodecError, CompressionError, SerializationError};
pub use threshold::{should_compress, DEFAULT_COMPRESSION_THRESHOLD};
