//! Payload serializers: encode/decode a typed message to/from bytes, tagged
//! by [`polyrpc_types::DataType`].
//!
//! Two binary variants are supported (`schema-A-binary`, `schema-B-binary`)
//! corresponding to the two schema languages' native wire formats. Since
//! code generation from schema files is out of scope, this crate cannot
//! emit either schema's *real* field
//! encoding (protobuf tag/wiretype assignment, or Thrift's own binary struct
//! grammar) — both require a compiled schema this framework never has. The
//! resolution recorded in `DESIGN.md`: both tags share one hand-rolled
//! compact binary codec ([`compact`]), positional rather than tag-keyed,
//! which is the same simplification a schema-less transport takes in
//! practice (bincode/postcard-style). `text-json` is the one variant with a
//! real, complete implementation ([`json`]), since JSON needs no schema
//! compiler to be self-describing.

pub mod compact;
pub mod json;

use bytes::Bytes;
use error_stack::Report;
use polyrpc_types::DataType;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::SerializationError;

/// Encodes `value` using the serializer selected by `tag`.
///
/// # Errors
///
/// Returns [`SerializationError::Encode`] if the underlying codec fails.
pub fn encode<T: Serialize>(tag: DataType, value: &T) -> Result<Bytes, Report<SerializationError>> {
    match tag {
        DataType::SchemaABinary | DataType::SchemaBBinary => compact::to_bytes(value),
        DataType::TextJson => json::to_bytes(value),
    }
}

/// Decodes a `T` using the serializer selected by `tag`.
///
/// # Errors
///
/// Returns [`SerializationError::Decode`] if the underlying codec fails.
pub fn decode<T: DeserializeOwned>(tag: DataType, bytes: &[u8]) -> Result<T, Report<SerializationError>> {
    match tag {
        DataType::SchemaABinary | DataType::SchemaBBinary => compact::from_slice(bytes),
        DataType::TextJson => json::from_slice(bytes),
    }
}
