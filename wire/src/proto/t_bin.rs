//! Protocol T-bin: Thrift-framed binary protocol.
//!
//! A 4-byte big-endian frame length, followed by a Thrift `TBinaryProtocol`
//! message envelope (strict form: a version-tagged `i32`, the method name, and
//! the seqid) and then the struct body. This crate only understands the
//! envelope — the struct body is opaque payload handed untouched to
//! `polyrpc-codec`'s schema-B-binary serializer without being copied again.

use bytes::{Bytes, BytesMut};

use crate::buffer::{read_u32_be, FrameWriter};
use crate::frame::{Frame, FrameCodec, ParseOutcome, ProtocolError};
use crate::proto::meta;

/// Strict-encoding version tag Thrift's `TBinaryProtocol` ORs into the first
/// word of every message envelope.
const VERSION_1: i32 = 0x8001_0000;
const ENVELOPE_MIN_LEN: usize = 4 + 4 + 4; // version+type, name length, seqid
const FRAME_PREFIX_LEN: usize = 4;

/// The Thrift message kind, carried in the low byte of the envelope's version word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThriftMessageType {
    Call,
    Reply,
    Exception,
    Oneway,
}

impl ThriftMessageType {
    #[must_use]
    pub fn as_i8(self) -> i8 {
        match self {
            Self::Call => 1,
            Self::Reply => 2,
            Self::Exception => 3,
            Self::Oneway => 4,
        }
    }

    #[must_use]
    pub fn from_i8(value: i8) -> Option<Self> {
        match value {
            1 => Some(Self::Call),
            2 => Some(Self::Reply),
            3 => Some(Self::Exception),
            4 => Some(Self::Oneway),
            _ => None,
        }
    }
}

/// The Thrift envelope this protocol parses: method identity and correlation,
/// with no separate compression/data-type/module-data slots — Thrift's classic
/// wire format has none, so the payload pipeline falls back to this protocol's
/// fixed default serializer (schema-B-binary) uncompressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThriftMeta {
    pub message_type: i8,
    pub method: String,
    /// Echoed verbatim in the reply; doubles as the correlation id on
    /// protocols without a dedicated field.
    pub seqid: i32,
}

impl ThriftMeta {
    #[must_use]
    pub fn call(method: impl Into<String>, seqid: i32) -> Self {
        Self {
            message_type: ThriftMessageType::Call.as_i8(),
            method: method.into(),
            seqid,
        }
    }

    #[must_use]
    pub fn reply(method: impl Into<String>, seqid: i32) -> Self {
        Self {
            message_type: ThriftMessageType::Reply.as_i8(),
            method: method.into(),
            seqid,
        }
    }

    #[must_use]
    pub fn exception(method: impl Into<String>, seqid: i32) -> Self {
        Self {
            message_type: ThriftMessageType::Exception.as_i8(),
            method: method.into(),
            seqid,
        }
    }
}

/// Zero-sized handle for the T-bin framer/parser pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct TBin;

impl FrameCodec for TBin {
    type Meta = ThriftMeta;

    fn encode(meta: &ThriftMeta, payload: &[u8]) -> Bytes {
        let method_bytes = meta.method.as_bytes();
        let envelope_len = ENVELOPE_MIN_LEN + method_bytes.len();
        let body_len = envelope_len + payload.len();

        let mut writer = FrameWriter::with_capacity(FRAME_PREFIX_LEN + body_len);
        writer.write_u32_be(body_len as u32);
        writer.write_u32_be(VERSION_1 as u32 | u32::from(meta.message_type as u8));
        writer.write_u32_be(method_bytes.len() as u32);
        writer.write_bytes(method_bytes);
        writer.write_u32_be(meta.seqid as u32);
        writer.write_bytes(payload);
        writer.into_bytes().freeze()
    }

    fn decode(buf: &mut BytesMut, ceiling: usize) -> ParseOutcome<ThriftMeta> {
        if buf.len() < FRAME_PREFIX_LEN {
            return ParseOutcome::NeedMoreBytes {
                needed: FRAME_PREFIX_LEN - buf.len(),
            };
        }

        let body_len = read_u32_be(&buf[0..4]) as usize;
        if body_len > ceiling {
            return ParseOutcome::Error(ProtocolError::oversized(body_len, ceiling));
        }

        let total = FRAME_PREFIX_LEN + body_len;
        if buf.len() < total {
            return ParseOutcome::NeedMoreBytes {
                needed: total - buf.len(),
            };
        }

        if body_len < ENVELOPE_MIN_LEN {
            return ParseOutcome::Error(ProtocolError::malformed(
                "Thrift envelope shorter than the minimum version+name+seqid header",
            ));
        }

        let version_word = read_u32_be(&buf[4..8]) as i32;
        if version_word & (0xFFFFu32 as i32) << 16 != VERSION_1 {
            return ParseOutcome::Error(ProtocolError::bad_magic(
                "Thrift strict-encoding version tag mismatch",
            ));
        }
        let message_type = (version_word & 0xFF) as i8;
        if ThriftMessageType::from_i8(message_type).is_none() {
            return ParseOutcome::Error(ProtocolError::malformed(format!(
                "unknown Thrift message type {message_type}"
            )));
        }

        let name_len = read_u32_be(&buf[8..12]) as usize;
        if ENVELOPE_MIN_LEN + name_len > body_len {
            return ParseOutcome::Error(ProtocolError::malformed(
                "Thrift method name length overruns the frame",
            ));
        }

        let name_start = FRAME_PREFIX_LEN + 8;
        let name_bytes = &buf[name_start..name_start + name_len];
        let method = match core::str::from_utf8(name_bytes) {
            Ok(value) => value.to_owned(),
            Err(_) => {
                return ParseOutcome::Error(ProtocolError::malformed(
                    "Thrift method name is not valid UTF-8",
                ));
            }
        };

        let seqid_start = name_start + name_len;
        let seqid = read_u32_be(&buf[seqid_start..seqid_start + 4]) as i32;

        let struct_start = seqid_start + 4;
        let struct_len = FRAME_PREFIX_LEN + body_len - struct_start;

        meta::advance(buf, struct_start);
        let payload = meta::split_bytes(buf, struct_len);

        ParseOutcome::Frame(Frame::new(
            ThriftMeta {
                message_type,
                method,
                seqid,
            },
            payload,
        ))
    }
}
