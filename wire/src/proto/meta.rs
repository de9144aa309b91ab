//! Compact binary meta encoding shared by the S-bin, B-bin, and Tr-bin protocols.
//!
//! Spec §4.1 calls this "schema-A encoded" meta: a small, self-contained binary
//! record carrying everything that isn't payload (status, correlation id, data
//! type, compression, method identity, and module-data). It is independent of
//! the *payload* schema codecs in `polyrpc-codec` — this crate never depends on
//! that one, so the meta format lives here instead.

use bytes::{Buf, Bytes, BytesMut};

use crate::buffer::{decode_varint, FrameWriter};
use crate::frame::ProtocolError;

/// Meta common to S-bin, B-bin, and Tr-bin frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonMeta {
    pub correlation_id: u64,
    pub data_type: u8,
    pub compress_type: u8,
    pub status: u16,
    pub service: String,
    pub method: String,
    pub module_data: Vec<(String, String)>,
    pub attachment: Option<Bytes>,
}

impl CommonMeta {
    #[must_use]
    pub fn request(correlation_id: u64, service: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            correlation_id,
            data_type: 0,
            compress_type: 0,
            status: 0,
            service: service.into(),
            method: method.into(),
            module_data: Vec::new(),
            attachment: None,
        }
    }

    #[must_use]
    pub fn reply(correlation_id: u64, status: u16) -> Self {
        Self {
            correlation_id,
            data_type: 0,
            compress_type: 0,
            status,
            service: String::new(),
            method: String::new(),
            module_data: Vec::new(),
            attachment: None,
        }
    }

    pub fn encode_into(&self, writer: &mut FrameWriter) {
        writer.write_varint(self.correlation_id);
        writer.write_u8(self.data_type);
        writer.write_u8(self.compress_type);
        writer.write_u16_be(self.status);

        write_string(writer, &self.service);
        write_string(writer, &self.method);

        writer.write_varint(self.module_data.len() as u64);
        for (key, value) in &self.module_data {
            write_string(writer, key);
            write_string(writer, value);
        }

        match &self.attachment {
            Some(bytes) => {
                writer.write_u8(1);
                writer.write_varint(bytes.len() as u64);
                writer.write_bytes(bytes);
            }
            None => writer.write_u8(0),
        }
    }

    pub fn encode(&self) -> Bytes {
        let mut writer = FrameWriter::default();
        self.encode_into(&mut writer);
        writer.into_bytes().freeze()
    }

    /// Decodes a [`CommonMeta`] from an exact-length slice (no trailing bytes
    /// permitted — the caller already sliced `meta_len` bytes off the frame).
    pub fn decode(mut input: &[u8]) -> Result<Self, ProtocolError> {
        let correlation_id = take_varint(&mut input)?;
        let data_type = take_u8(&mut input)?;
        let compress_type = take_u8(&mut input)?;
        let status = take_u16_be(&mut input)?;
        let service = take_string(&mut input)?;
        let method = take_string(&mut input)?;

        let count = take_varint(&mut input)?;
        let mut module_data = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            let key = take_string(&mut input)?;
            let value = take_string(&mut input)?;
            module_data.push((key, value));
        }

        let has_attachment = take_u8(&mut input)?;
        let attachment = if has_attachment == 1 {
            let len = take_varint(&mut input)? as usize;
            if input.len() < len {
                return Err(ProtocolError::meta_error("attachment truncated"));
            }
            let (attachment, rest) = input.split_at(len);
            input = rest;
            Some(Bytes::copy_from_slice(attachment))
        } else {
            None
        };

        if !input.is_empty() {
            return Err(ProtocolError::meta_error("trailing bytes after meta"));
        }

        Ok(Self {
            correlation_id,
            data_type,
            compress_type,
            status,
            service,
            method,
            module_data,
            attachment,
        })
    }
}

fn write_string(writer: &mut FrameWriter, value: &str) {
    writer.write_varint(value.len() as u64);
    writer.write_bytes(value.as_bytes());
}

fn take_u8(input: &mut &[u8]) -> Result<u8, ProtocolError> {
    if input.is_empty() {
        return Err(ProtocolError::meta_error("unexpected end of meta"));
    }
    let value = input[0];
    *input = &input[1..];
    Ok(value)
}

fn take_u16_be(input: &mut &[u8]) -> Result<u16, ProtocolError> {
    if input.len() < 2 {
        return Err(ProtocolError::meta_error("unexpected end of meta"));
    }
    let value = crate::buffer::read_u16_be(input);
    *input = &input[2..];
    Ok(value)
}

fn take_varint(input: &mut &[u8]) -> Result<u64, ProtocolError> {
    let (value, consumed) =
        decode_varint(input).ok_or_else(|| ProtocolError::meta_error("truncated varint"))?;
    *input = &input[consumed..];
    Ok(value)
}

fn take_string(input: &mut &[u8]) -> Result<String, ProtocolError> {
    let len = take_varint(input)? as usize;
    if input.len() < len {
        return Err(ProtocolError::meta_error("truncated string"));
    }
    let (bytes, rest) = input.split_at(len);
    *input = rest;
    String::from_utf8(bytes.to_vec()).map_err(|_| ProtocolError::meta_error("string is not valid UTF-8"))
}

/// Advances `buf` past `len` bytes, returning them as a zero-copy [`Bytes`] view.
pub(crate) fn split_bytes(buf: &mut BytesMut, len: usize) -> Bytes {
    buf.split_to(len).freeze()
}

/// Required so callers can discard consumed prefix bytes without decoding them.
pub(crate) fn advance(buf: &mut BytesMut, len: usize) {
    Buf::advance(buf, len);
}

#[cfg(test)]
mod tests {
    use super::CommonMeta;

    #[test]
    fn round_trips_with_module_data_and_attachment() {
        let mut meta = CommonMeta::request(42, "Echo", "Ping");
        meta.module_data.push(("trace-id".to_owned(), "abc".to_owned()));
        meta.attachment = Some(bytes::Bytes::from_static(b"extra"));

        let encoded = meta.encode();
        let decoded = CommonMeta::decode(&encoded).expect("valid meta");
        assert_eq!(decoded, meta);
    }

    #[test]
    fn round_trips_without_optional_fields() {
        let meta = CommonMeta::reply(7, 0);
        let encoded = meta.encode();
        let decoded = CommonMeta::decode(&encoded).expect("valid meta");
        assert_eq!(decoded, meta);
    }

    #[test]
    fn rejects_truncated_meta() {
        let meta = CommonMeta::request(1, "S", "M");
        let mut encoded = meta.encode().to_vec();
        encoded.truncate(encoded.len() - 1);
        assert!(CommonMeta::decode(&encoded).is_err());
    }

    proptest::proptest! {
        #[test]
        fn round_trips_any_correlation_id_service_method_and_module_data(
            correlation_id: u64,
            status: u16,
            service in "[a-zA-Z0-9_./]{0,32}",
            method in "[a-zA-Z0-9_./]{0,32}",
            module_data in proptest::collection::vec(("[a-zA-Z0-9_-]{0,16}", "[a-zA-Z0-9_ -]{0,64}"), 0..8),
        ) {
            let mut meta = CommonMeta::request(correlation_id, service, method);
            meta.status = status;
            meta.module_data = module_data;

            let decoded = CommonMeta::decode(&meta.encode()).expect("valid meta");
            assert_eq!(decoded, meta);
        }
    }
}
