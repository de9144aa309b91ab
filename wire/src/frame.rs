//! The common parser contract shared by every protocol in [`crate::proto`].

use bytes::{Bytes, BytesMut};
use core::fmt;

/// One parsed message: protocol-specific meta plus a payload view.
///
/// `payload` is a [`Bytes`] slice sharing the parser's read buffer storage — an
/// `Arc`-backed view, not a copy — so handing it to the payload pipeline never
/// duplicates the underlying bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame<M> {
    pub meta: M,
    pub payload: Bytes,
}

impl<M> Frame<M> {
    #[must_use]
    pub fn new(meta: M, payload: Bytes) -> Self {
        Self { meta, payload }
    }
}

/// Result of one parse attempt against a read buffer.
///
/// Mirrors the `IDLE -> PREFIX_READ -> META_READ -> PAYLOAD_READ -> EMIT -> IDLE`
/// state machine: a parser is pull-driven, called again with more bytes
/// appended to the same buffer whenever it reports `NeedMoreBytes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome<M> {
    /// The buffer does not yet contain a full frame. `needed` is the exact
    /// number of additional bytes required to make progress.
    NeedMoreBytes { needed: usize },
    /// A complete frame was parsed and removed from the front of the buffer.
    Frame(Frame<M>),
    /// The buffer contains data that can never form a valid frame. The
    /// connection must be closed.
    Error(ProtocolError),
}

/// The kind of framing failure, independent of which protocol detected it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolErrorKind {
    /// A magic number or version byte did not match what this protocol expects.
    BadMagic,
    /// An announced meta or payload length exceeds the configured ceiling.
    Oversized,
    /// Meta bytes could not be decoded into a well-formed header (includes
    /// unknown/contradictory HTTP header values on the S-http adapter).
    MetaError,
    /// The frame is otherwise malformed (e.g. a seqid mismatch on T-bin).
    Malformed,
}

impl fmt::Display for ProtocolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BadMagic => "bad-magic",
            Self::Oversized => "oversized",
            Self::MetaError => "meta-error",
            Self::Malformed => "malformed",
        };
        f.write_str(name)
    }
}

/// A framing or meta-decoding failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("protocol error ({kind}): {detail}")]
pub struct ProtocolError {
    pub kind: ProtocolErrorKind,
    pub detail: String,
}

impl ProtocolError {
    #[must_use]
    pub fn new(kind: ProtocolErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn bad_magic(detail: impl Into<String>) -> Self {
        Self::new(ProtocolErrorKind::BadMagic, detail)
    }

    #[must_use]
    pub fn oversized(len: usize, ceiling: usize) -> Self {
        Self::new(
            ProtocolErrorKind::Oversized,
            format!("frame of {len} bytes exceeds the {ceiling}-byte ceiling"),
        )
    }

    #[must_use]
    pub fn meta_error(detail: impl Into<String>) -> Self {
        Self::new(ProtocolErrorKind::MetaError, detail)
    }

    #[must_use]
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::new(ProtocolErrorKind::Malformed, detail)
    }
}

/// Default ceiling on meta-length and payload-length, in bytes.
pub const DEFAULT_FRAME_CEILING: usize = 64 * 1024 * 1024;

/// One wire protocol's framer/parser pair.
///
/// Implementations are stateless (zero-sized types): every protocol in this
/// crate can frame or parse a message knowing only the bytes in front of it,
/// so there is nothing to carry between calls beyond the read buffer itself.
pub trait FrameCodec {
    /// The protocol's meta representation.
    type Meta: Clone + fmt::Debug;

    /// Serializes `meta` and `payload` into one frame's worth of bytes.
    fn encode(meta: &Self::Meta, payload: &[u8]) -> Bytes;

    /// Attempts to parse one frame from the front of `buf`, consuming it on
    /// success. `ceiling` bounds any individual meta/payload/frame length this
    /// protocol announces.
    fn decode(buf: &mut BytesMut, ceiling: usize) -> ParseOutcome<Self::Meta>;
}
