//! Leaf error types for the payload pipeline, per §10.1's layering: narrow
//! `thiserror` context types attached to an `error_stack::Report`.

use thiserror::Error;

/// A failure while converting a typed value to or from wire bytes.
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("failed to encode payload with {codec}")]
    Encode { codec: &'static str },
    #[error("failed to decode payload with {codec}")]
    Decode { codec: &'static str },
    #[error("{0}")]
    Message(String),
}

/// A failure while compressing or decompressing a payload.
#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("failed to compress payload with {codec}")]
    Compress { codec: &'static str },
    #[error("failed to decompress payload with {codec}")]
    Decompress { codec: &'static str },
}

/// Either half of the payload pipeline failing, surfaced together where
/// callers need one error type spanning both (e.g. a combined encode+compress
/// convenience).
#[derive(Debug, Error)]
pub enum CodecError {
    #[error(transparent)]
    Serialization(#[from] SerializationError),
    #[error(transparent)]
    Compression(#[from] CompressionError),
}
