//! Protocol B-bin: 12-byte prefix framing.
//!
//! 4-byte magic `"PRPC"`, 4-byte meta-length (BE), 4-byte body-length (BE),
//! followed by schema-A-encoded meta (carrying the correlation id) then
//! payload. Shares [`CommonMeta`] with [`crate::proto::s_bin`] and
//! [`crate::proto::tr_bin`] — only the prefix layout and byte order differ.

use bytes::{Bytes, BytesMut};

use crate::buffer::{read_u32_be, FrameWriter};
use crate::frame::{Frame, FrameCodec, ParseOutcome, ProtocolError};
use crate::proto::meta::{self, CommonMeta};

const MAGIC: &[u8; 4] = b"PRPC";
const PREFIX_LEN: usize = 12;

/// Zero-sized handle for the B-bin framer/parser pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct BBin;

impl FrameCodec for BBin {
    type Meta = CommonMeta;

    fn encode(meta: &CommonMeta, payload: &[u8]) -> Bytes {
        let meta_bytes = meta.encode();

        let mut writer = FrameWriter::with_capacity(PREFIX_LEN + meta_bytes.len() + payload.len());
        writer.write_bytes(MAGIC);
        writer.write_u32_be(meta_bytes.len() as u32);
        writer.write_u32_be(payload.len() as u32);
        writer.write_bytes(&meta_bytes);
        writer.write_bytes(payload);
        writer.into_bytes().freeze()
    }

    fn decode(buf: &mut BytesMut, ceiling: usize) -> ParseOutcome<CommonMeta> {
        if buf.len() < PREFIX_LEN {
            return ParseOutcome::NeedMoreBytes {
                needed: PREFIX_LEN - buf.len(),
            };
        }

        if &buf[0..4] != MAGIC {
            return ParseOutcome::Error(ProtocolError::bad_magic("B-bin magic mismatch"));
        }

        let meta_len = read_u32_be(&buf[4..8]) as usize;
        let body_len = read_u32_be(&buf[8..12]) as usize;

        if meta_len > ceiling || body_len > ceiling {
            return ParseOutcome::Error(ProtocolError::oversized(meta_len.max(body_len), ceiling));
        }

        let total = PREFIX_LEN + meta_len + body_len;
        if buf.len() < total {
            return ParseOutcome::NeedMoreBytes {
                needed: total - buf.len(),
            };
        }

        meta::advance(buf, PREFIX_LEN);
        let meta_bytes = meta::split_bytes(buf, meta_len);
        let payload = meta::split_bytes(buf, body_len);

        match CommonMeta::decode(&meta_bytes) {
            Ok(decoded) => ParseOutcome::Frame(Frame::new(decoded, payload)),
            Err(err) => ParseOutcome::Error(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::{Bytes, BytesMut};

    use super::BBin;
    use crate::frame::{FrameCodec, ParseOutcome, DEFAULT_FRAME_CEILING};
    use crate::proto::meta::CommonMeta;

    #[test]
    fn round_trips_a_request_frame() {
        let meta = CommonMeta::request(7, "Add", "Sum");
        let payload = b"123,456";
        let encoded = BBin::encode(&meta, payload);

        let mut buf = BytesMut::from(&encoded[..]);
        match BBin::decode(&mut buf, DEFAULT_FRAME_CEILING) {
            ParseOutcome::Frame(frame) => {
                assert_eq!(frame.meta, meta);
                assert_eq!(frame.payload, Bytes::from_static(payload));
            }
            other => panic!("expected a complete frame, got {other:?}"),
        }
    }

    #[test]
    fn reports_need_more_bytes_before_prefix_complete() {
        let mut buf = BytesMut::from(&b"PRPC"[..]);
        match BBin::decode(&mut buf, DEFAULT_FRAME_CEILING) {
            ParseOutcome::NeedMoreBytes { needed } => assert_eq!(needed, 8),
            other => panic!("expected NeedMoreBytes, got {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_magic() {
        let mut buf = BytesMut::from(&b"XXXX000000000000"[..]);
        match BBin::decode(&mut buf, DEFAULT_FRAME_CEILING) {
            ParseOutcome::Error(err) => {
                assert_eq!(err.kind, crate::frame::ProtocolErrorKind::BadMagic);
            }
            other => panic!("expected an error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_oversized_frames() {
        let meta = CommonMeta::request(1, "Add", "Sum");
        let encoded = BBin::encode(&meta, b"hi");
        let mut buf = BytesMut::from(&encoded[..]);
        match BBin::decode(&mut buf, 1) {
            ParseOutcome::Error(err) => {
                assert_eq!(err.kind, crate::frame::ProtocolErrorKind::Oversized);
            }
            other => panic!("expected an error, got {other:?}"),
        }
    }
}
