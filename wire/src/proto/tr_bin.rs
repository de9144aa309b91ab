//! Protocol Tr-bin: the "T protocol" framing.
//!
//! Fixed 16-byte prefix — 2-byte magic, 1-byte version, 1-byte frame-type,
//! 4-byte total-length (BE), 4-byte header-length (BE), 4-byte meta-length
//! (BE), 2-byte reserved — followed by a schema-A-encoded header (carrying a
//! slash-combined `/service/method` string), schema-A-encoded meta (reusing
//! [`CommonMeta`]), then payload.

use bytes::{Bytes, BytesMut};

use crate::buffer::{read_u32_be, FrameWriter};
use crate::frame::{Frame, FrameCodec, ParseOutcome, ProtocolError};
use crate::proto::meta::{self, CommonMeta};

const MAGIC: &[u8; 2] = b"TR";
const VERSION: u8 = 1;
// The field list sums to 2+1+1+4+4+4+2 = 18 bytes despite the "16-byte
// prefix" name this protocol keeps historically; 18 bytes is what's actually
// consumed (see DESIGN.md).
const PREFIX_LEN: usize = 18;

/// Tr-bin's header+meta pair: the combined method path plus the shared
/// schema-A meta record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrBinMeta {
    pub frame_type: u8,
    pub common: CommonMeta,
}

impl TrBinMeta {
    #[must_use]
    pub fn new(frame_type: u8, common: CommonMeta) -> Self {
        Self { frame_type, common }
    }

    /// The `/service/method` path carried in the header section.
    #[must_use]
    fn combined_method(&self) -> String {
        format!("/{}/{}", self.common.service, self.common.method)
    }
}

/// Splits a header's combined `/service/method` path back into its parts,
/// trimming the leading slash.
fn split_combined_method(path: &str) -> (String, String) {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    match trimmed.split_once('/') {
        Some((service, method)) => (service.to_owned(), method.to_owned()),
        None => (trimmed.to_owned(), String::new()),
    }
}

/// Zero-sized handle for the Tr-bin framer/parser pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrBin;

impl FrameCodec for TrBin {
    type Meta = TrBinMeta;

    fn encode(meta: &TrBinMeta, payload: &[u8]) -> Bytes {
        let mut header_writer = FrameWriter::default();
        let combined = meta.combined_method();
        header_writer.write_varint(combined.len() as u64);
        header_writer.write_bytes(combined.as_bytes());
        let header_bytes = header_writer.into_bytes();

        let meta_bytes = meta.common.encode();

        let total_len = header_bytes.len() + meta_bytes.len() + payload.len();

        let mut writer = FrameWriter::with_capacity(PREFIX_LEN + total_len);
        writer.write_bytes(MAGIC);
        writer.write_u8(VERSION);
        writer.write_u8(meta.frame_type);
        writer.write_u32_be(total_len as u32);
        writer.write_u32_be(header_bytes.len() as u32);
        writer.write_u32_be(meta_bytes.len() as u32);
        writer.write_u16_be(0); // reserved
        writer.write_bytes(&header_bytes);
        writer.write_bytes(&meta_bytes);
        writer.write_bytes(payload);
        writer.into_bytes().freeze()
    }

    fn decode(buf: &mut BytesMut, ceiling: usize) -> ParseOutcome<TrBinMeta> {
        if buf.len() < PREFIX_LEN {
            return ParseOutcome::NeedMoreBytes {
                needed: PREFIX_LEN - buf.len(),
            };
        }

        if &buf[0..2] != MAGIC {
            return ParseOutcome::Error(ProtocolError::bad_magic("Tr-bin magic mismatch"));
        }
        if buf[2] != VERSION {
            return ParseOutcome::Error(ProtocolError::bad_magic("Tr-bin version mismatch"));
        }
        let frame_type = buf[3];

        let total_len = read_u32_be(&buf[4..8]) as usize;
        let header_len = read_u32_be(&buf[8..12]) as usize;
        let meta_len = read_u32_be(&buf[12..16]) as usize;
        // buf[16..18] is the reserved field; nothing to validate.

        if total_len > ceiling || header_len > ceiling || meta_len > ceiling {
            return ParseOutcome::Error(ProtocolError::oversized(
                total_len.max(header_len).max(meta_len),
                ceiling,
            ));
        }
        if header_len + meta_len > total_len {
            return ParseOutcome::Error(ProtocolError::malformed(
                "Tr-bin header+meta length exceeds total length",
            ));
        }

        let frame_len = PREFIX_LEN + total_len;
        if buf.len() < frame_len {
            return ParseOutcome::NeedMoreBytes {
                needed: frame_len - buf.len(),
            };
        }

        meta::advance(buf, PREFIX_LEN);
        let header_bytes = meta::split_bytes(buf, header_len);
        let meta_bytes = meta::split_bytes(buf, meta_len);
        let payload_len = total_len - header_len - meta_len;
        let payload = meta::split_bytes(buf, payload_len);

        let combined = match decode_header(&header_bytes) {
            Ok(path) => path,
            Err(err) => return ParseOutcome::Error(err),
        };
        let (service, method) = split_combined_method(&combined);

        let mut common = match CommonMeta::decode(&meta_bytes) {
            Ok(decoded) => decoded,
            Err(err) => return ParseOutcome::Error(err),
        };
        common.service = service;
        common.method = method;

        ParseOutcome::Frame(Frame::new(TrBinMeta::new(frame_type, common), payload))
    }
}

fn decode_header(input: &[u8]) -> Result<String, ProtocolError> {
    let (len, consumed) = crate::buffer::decode_varint(input)
        .ok_or_else(|| ProtocolError::meta_error("truncated Tr-bin header length"))?;
    let len = len as usize;
    let rest = &input[consumed..];
    if rest.len() != len {
        return Err(ProtocolError::meta_error("Tr-bin header length mismatch"));
    }
    String::from_utf8(rest.to_vec()).map_err(|_| ProtocolError::meta_error("Tr-bin header is not valid UTF-8"))
}

#[cfg(test)]
mod tests {
    use bytes::{Bytes, BytesMut};

    use super::{TrBin, TrBinMeta};
    use crate::frame::{FrameCodec, ParseOutcome, DEFAULT_FRAME_CEILING};
    use crate::proto::meta::CommonMeta;

    #[test]
    fn round_trips_and_recovers_service_and_method_from_header() {
        let common = CommonMeta::request(5, "Echo", "Ping");
        let meta = TrBinMeta::new(0, common);
        let payload = b"payload-bytes";
        let encoded = TrBin::encode(&meta, payload);

        let mut buf = BytesMut::from(&encoded[..]);
        match TrBin::decode(&mut buf, DEFAULT_FRAME_CEILING) {
            ParseOutcome::Frame(frame) => {
                assert_eq!(frame.meta.common.service, "Echo");
                assert_eq!(frame.meta.common.method, "Ping");
                assert_eq!(frame.payload, Bytes::from_static(payload));
            }
            other => panic!("expected a complete frame, got {other:?}"),
        }
    }

    #[test]
    fn reports_need_more_bytes_before_prefix_complete() {
        let mut buf = BytesMut::from(&b"TR\x01\x00"[..]);
        match TrBin::decode(&mut buf, DEFAULT_FRAME_CEILING) {
            ParseOutcome::NeedMoreBytes { needed } => assert_eq!(needed, 14),
            other => panic!("expected NeedMoreBytes, got {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_magic() {
        let mut buf = BytesMut::from(&b"XX\x01\x00000000000000000000"[..]);
        match TrBin::decode(&mut buf, DEFAULT_FRAME_CEILING) {
            ParseOutcome::Error(err) => {
                assert_eq!(err.kind, crate::frame::ProtocolErrorKind::BadMagic);
            }
            other => panic!("expected an error, got {other:?}"),
        }
    }
}
