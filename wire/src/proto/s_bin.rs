//! Protocol S-bin: compact binary framing.
//!
//! Fixed 16-byte prefix — 4-byte magic, 1-byte reserved, 1-byte data-type,
//! 1-byte compress-type, 1-byte reserved, 4-byte meta-length (LE), 4-byte
//! message-length (LE) — followed by schema-A-encoded meta, then payload.
//! Correlation is carried inside meta as the call-id field.

use bytes::{Bytes, BytesMut};

use crate::buffer::{read_u32_le, FrameWriter};
use crate::frame::{Frame, FrameCodec, ParseOutcome, ProtocolError};
use crate::proto::meta::{self, CommonMeta};

const MAGIC: &[u8; 4] = b"SRPC";
const PREFIX_LEN: usize = 16;

/// Zero-sized handle for the S-bin framer/parser pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct SBin;

impl FrameCodec for SBin {
    type Meta = CommonMeta;

    fn encode(meta: &CommonMeta, payload: &[u8]) -> Bytes {
        let meta_bytes = meta.encode();

        let mut writer = FrameWriter::with_capacity(PREFIX_LEN + meta_bytes.len() + payload.len());
        writer.write_bytes(MAGIC);
        writer.write_u8(0); // reserved
        writer.write_u8(meta.data_type);
        writer.write_u8(meta.compress_type);
        writer.write_u8(0); // reserved
        writer.write_u32_le(meta_bytes.len() as u32);
        writer.write_u32_le(payload.len() as u32);
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
            return ParseOutcome::Error(ProtocolError::bad_magic("S-bin magic mismatch"));
        }

        let meta_len = read_u32_le(&buf[8..12]) as usize;
        let msg_len = read_u32_le(&buf[12..16]) as usize;

        if meta_len > ceiling || msg_len > ceiling {
            return ParseOutcome::Error(ProtocolError::oversized(meta_len.max(msg_len), ceiling));
        }

        let total = PREFIX_LEN + meta_len + msg_len;
        if buf.len() < total {
            return ParseOutcome::NeedMoreBytes {
                needed: total - buf.len(),
            };
        }

        meta::advance(buf, PREFIX_LEN);
        let meta_bytes = meta::split_bytes(buf, meta_len);
        let payload = meta::split_bytes(buf, msg_len);

        match CommonMeta::decode(&meta_bytes) {
            Ok(decoded) => ParseOutcome::Frame(Frame::new(decoded, payload)),
            Err(err) => ParseOutcome::Error(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::{Bytes, BytesMut};

    use super::SBin;
    use crate::frame::{FrameCodec, ParseOutcome, DEFAULT_FRAME_CEILING};
    use crate::proto::meta::CommonMeta;

    #[test]
    fn round_trips_a_request_frame() {
        let meta = CommonMeta::request(1, "Echo", "Ping");
        let payload = b"hello";
        let encoded = SBin::encode(&meta, payload);

        let mut buf = BytesMut::from(&encoded[..]);
        match SBin::decode(&mut buf, DEFAULT_FRAME_CEILING) {
            ParseOutcome::Frame(frame) => {
                assert_eq!(frame.meta, meta);
                assert_eq!(frame.payload, Bytes::from_static(payload));
            }
            other => panic!("expected a complete frame, got {other:?}"),
        }
        assert!(buf.is_empty());
    }

    #[test]
    fn zero_length_payload_is_legal() {
        let meta = CommonMeta::request(1, "Echo", "Ping");
        let encoded = SBin::encode(&meta, b"");
        let mut buf = BytesMut::from(&encoded[..]);
        match SBin::decode(&mut buf, DEFAULT_FRAME_CEILING) {
            ParseOutcome::Frame(frame) => assert!(frame.payload.is_empty()),
            other => panic!("expected a complete frame, got {other:?}"),
        }
    }

    #[test]
    fn reports_need_more_bytes_before_prefix_complete() {
        let mut buf = BytesMut::from(&b"SRPC"[..]);
        match SBin::decode(&mut buf, DEFAULT_FRAME_CEILING) {
            ParseOutcome::NeedMoreBytes { needed } => assert_eq!(needed, 12),
            other => panic!("expected NeedMoreBytes, got {other:?}"),
        }
    }

    #[test]
    fn reports_need_more_bytes_when_body_incomplete() {
        let meta = CommonMeta::request(1, "Echo", "Ping");
        let encoded = SBin::encode(&meta, b"hello world");
        let mut buf = BytesMut::from(&encoded[..encoded.len() - 3]);
        match SBin::decode(&mut buf, DEFAULT_FRAME_CEILING) {
            ParseOutcome::NeedMoreBytes { needed } => assert_eq!(needed, 3),
            other => panic!("expected NeedMoreBytes, got {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_magic() {
        let mut buf = BytesMut::from(&b"XXXX0000000000000000"[..]);
        match SBin::decode(&mut buf, DEFAULT_FRAME_CEILING) {
            ParseOutcome::Error(err) => {
                assert_eq!(err.kind, crate::frame::ProtocolErrorKind::BadMagic);
            }
            other => panic!("expected an error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_oversized_frames() {
        let meta = CommonMeta::request(1, "Echo", "Ping");
        let encoded = SBin::encode(&meta, b"hi");
        let mut buf = BytesMut::from(&encoded[..]);
        match SBin::decode(&mut buf, 1) {
            ParseOutcome::Error(err) => {
                assert_eq!(err.kind, crate::frame::ProtocolErrorKind::Oversized);
            }
            other => panic!("expected an error, got {other:?}"),
        }
    }

    proptest::proptest! {
        #[test]
        fn round_trips_any_correlation_id_and_payload(correlation_id: u64, payload in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..256)) {
            let meta = CommonMeta::request(correlation_id, "Echo", "Ping");
            let encoded = SBin::encode(&meta, &payload);

            let mut buf = BytesMut::from(&encoded[..]);
            match SBin::decode(&mut buf, DEFAULT_FRAME_CEILING) {
                ParseOutcome::Frame(frame) => {
                    assert_eq!(frame.meta, meta);
                    assert_eq!(&frame.payload[..], &payload[..]);
                }
                other => panic!("expected a complete frame, got {other:?}"),
            }
            assert!(buf.is_empty());
        }
    }
}
