//! Protocol S-http: S-bin semantics tunneled over HTTP/1.1.
//!
//! A request is an HTTP POST whose URI path is `/<service>/<method>`, headers
//! carry the data-type/compression tags and module-data (`SRPC-Meta-*`), and
//! the payload is the body. A reply is always HTTP 200 at the transport
//! level, even if the RPC itself returned a logical error, with the RPC
//! status in the reserved `SRPC-Status` header.
//!
//! Unlike the fixed-prefix protocols in this module, the exact byte deficit
//! for an incomplete header section is not knowable in advance — [`httparse`]
//! only reports "partial" — so [`crate::frame::ParseOutcome::NeedMoreBytes`]
//! reports a deficit of 1 until the header section completes, at which point
//! `Content-Length` makes the remaining deficit exact again.

use bytes::{Bytes, BytesMut};

use crate::buffer::FrameWriter;
use crate::frame::{Frame, FrameCodec, ParseOutcome, ProtocolError};
use crate::proto::meta;
use polyrpc_types::{CompressType, DataType};

const MODULE_DATA_HEADER_PREFIX: &str = "srpc-meta-";
const MAX_HEADERS: usize = 64;

/// S-http's meta: distinct request/response shapes, since an HTTP message is
/// one or the other and each carries different fields (URI vs. status line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SHttpMeta {
    Request {
        service: String,
        method: String,
        data_type: u8,
        compress_type: u8,
        module_data: Vec<(String, String)>,
    },
    Response {
        /// The HTTP-level status code (always 200 for a transport-successful RPC).
        http_status: u16,
        /// The RPC-level status carried in the `SRPC-Status` header.
        status: u16,
        data_type: u8,
        compress_type: u8,
        module_data: Vec<(String, String)>,
    },
}

/// Zero-sized handle for the S-http framer/parser pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct SHttp;

impl FrameCodec for SHttp {
    type Meta = SHttpMeta;

    fn encode(meta: &SHttpMeta, payload: &[u8]) -> Bytes {
        let mut writer = FrameWriter::with_capacity(256 + payload.len());
        match meta {
            SHttpMeta::Request {
                service,
                method,
                data_type,
                compress_type,
                module_data,
            } => {
                writer.write_bytes(format!("POST /{service}/{method} HTTP/1.1\r\n").as_bytes());
                write_payload_headers(&mut writer, *data_type, *compress_type, payload.len());
                write_module_data_headers(&mut writer, module_data);
                writer.write_bytes(b"\r\n");
            }
            SHttpMeta::Response {
                status,
                data_type,
                compress_type,
                module_data,
                ..
            } => {
                writer.write_bytes(b"HTTP/1.1 200 OK\r\n");
                writer.write_bytes(format!("SRPC-Status: {status}\r\n").as_bytes());
                write_payload_headers(&mut writer, *data_type, *compress_type, payload.len());
                write_module_data_headers(&mut writer, module_data);
                writer.write_bytes(b"\r\n");
            }
        }
        writer.write_bytes(payload);
        writer.into_bytes().freeze()
    }

    fn decode(buf: &mut BytesMut, ceiling: usize) -> ParseOutcome<SHttpMeta> {
        if buf.is_empty() {
            return ParseOutcome::NeedMoreBytes { needed: 1 };
        }
        if buf.starts_with(b"HTTP/") {
            decode_response(buf, ceiling)
        } else {
            decode_request(buf, ceiling)
        }
    }
}

fn write_payload_headers(writer: &mut FrameWriter, data_type: u8, compress_type: u8, body_len: usize) {
    let content_type = DataType::from_u8(data_type).map_or("application/octet-stream", DataType::content_type);
    let content_encoding = CompressType::from_u8(compress_type).map_or("identity", CompressType::content_encoding);
    writer.write_bytes(format!("Content-Type: {content_type}\r\n").as_bytes());
    writer.write_bytes(format!("Content-Encoding: {content_encoding}\r\n").as_bytes());
    writer.write_bytes(format!("Content-Length: {body_len}\r\n").as_bytes());
}

fn write_module_data_headers(writer: &mut FrameWriter, module_data: &[(String, String)]) {
    for (key, value) in module_data {
        writer.write_bytes(format!("SRPC-Meta-{key}: {value}\r\n").as_bytes());
    }
}

/// Common shape extracted from a parsed header list, independent of whether it
/// came from a request or a response.
struct ParsedHeaders {
    data_type: u8,
    compress_type: u8,
    module_data: Vec<(String, String)>,
    content_length: usize,
    srpc_status: Option<u16>,
}

fn extract_headers(headers: &[httparse::Header<'_>]) -> Result<ParsedHeaders, ProtocolError> {
    let mut data_type = None;
    let mut compress_type = None;
    let mut module_data = Vec::new();
    let mut content_length = None;
    let mut srpc_status = None;

    for header in headers {
        let name = header.name;
        if name.eq_ignore_ascii_case("Content-Type") {
            let value = header_str(header)?;
            data_type = Some(
                DataType::from_content_type(value)
                    .ok_or_else(|| ProtocolError::meta_error(format!("unrecognized Content-Type {value:?}")))?,
            );
        } else if name.eq_ignore_ascii_case("Content-Encoding") {
            let value = header_str(header)?;
            compress_type = Some(
                CompressType::from_content_encoding(value)
                    .ok_or_else(|| ProtocolError::meta_error(format!("unrecognized Content-Encoding {value:?}")))?,
            );
        } else if name.eq_ignore_ascii_case("Content-Length") {
            let value = header_str(header)?;
            content_length = Some(
                value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| ProtocolError::meta_error("Content-Length is not a valid integer"))?,
            );
        } else if name.eq_ignore_ascii_case("SRPC-Status") {
            let value = header_str(header)?;
            srpc_status = Some(
                value
                    .trim()
                    .parse::<u16>()
                    .map_err(|_| ProtocolError::meta_error("SRPC-Status is not a valid integer"))?,
            );
        } else if name.len() > MODULE_DATA_HEADER_PREFIX.len()
            && name[..MODULE_DATA_HEADER_PREFIX.len()].eq_ignore_ascii_case(MODULE_DATA_HEADER_PREFIX)
        {
            let key = name[MODULE_DATA_HEADER_PREFIX.len()..].to_owned();
            let value = header_str(header)?.to_owned();
            module_data.push((key, value));
        }
    }

    Ok(ParsedHeaders {
        // Absent header defaults to "none"/text-json.
        data_type: data_type.unwrap_or(DataType::TextJson).as_u8(),
        compress_type: compress_type.unwrap_or(CompressType::None).as_u8(),
        module_data,
        content_length: content_length.unwrap_or(0),
        srpc_status,
    })
}

fn header_str<'a>(header: &httparse::Header<'a>) -> Result<&'a str, ProtocolError> {
    core::str::from_utf8(header.value).map_err(|_| ProtocolError::meta_error("header value is not valid UTF-8"))
}

fn decode_request(buf: &mut BytesMut, ceiling: usize) -> ParseOutcome<SHttpMeta> {
    let mut header_storage = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut header_storage);

    let header_len = match req.parse(buf) {
        Ok(httparse::Status::Complete(len)) => len,
        Ok(httparse::Status::Partial) => return ParseOutcome::NeedMoreBytes { needed: 1 },
        Err(err) => return ParseOutcome::Error(ProtocolError::malformed(format!("invalid HTTP request: {err}"))),
    };

    let path = match req.path {
        Some(path) => path,
        None => return ParseOutcome::Error(ProtocolError::meta_error("HTTP request is missing a URI")),
    };
    let (service, method) = match split_path(path) {
        Some(parts) => parts,
        None => {
            return ParseOutcome::Error(ProtocolError::meta_error(
                "URI path must be /<service>/<method>",
            ));
        }
    };

    let parsed = match extract_headers(req.headers) {
        Ok(parsed) => parsed,
        Err(err) => return ParseOutcome::Error(err),
    };

    if parsed.content_length > ceiling {
        return ParseOutcome::Error(ProtocolError::oversized(parsed.content_length, ceiling));
    }

    let total = header_len + parsed.content_length;
    if buf.len() < total {
        return ParseOutcome::NeedMoreBytes {
            needed: total - buf.len(),
        };
    }

    meta::advance(buf, header_len);
    let payload = meta::split_bytes(buf, parsed.content_length);

    ParseOutcome::Frame(Frame::new(
        SHttpMeta::Request {
            service,
            method,
            data_type: parsed.data_type,
            compress_type: parsed.compress_type,
            module_data: parsed.module_data,
        },
        payload,
    ))
}

fn decode_response(buf: &mut BytesMut, ceiling: usize) -> ParseOutcome<SHttpMeta> {
    let mut header_storage = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut resp = httparse::Response::new(&mut header_storage);

    let header_len = match resp.parse(buf) {
        Ok(httparse::Status::Complete(len)) => len,
        Ok(httparse::Status::Partial) => return ParseOutcome::NeedMoreBytes { needed: 1 },
        Err(err) => return ParseOutcome::Error(ProtocolError::malformed(format!("invalid HTTP response: {err}"))),
    };

    let http_status = resp.code.unwrap_or(0);

    let parsed = match extract_headers(resp.headers) {
        Ok(parsed) => parsed,
        Err(err) => return ParseOutcome::Error(err),
    };

    if parsed.content_length > ceiling {
        return ParseOutcome::Error(ProtocolError::oversized(parsed.content_length, ceiling));
    }

    let total = header_len + parsed.content_length;
    if buf.len() < total {
        return ParseOutcome::NeedMoreBytes {
            needed: total - buf.len(),
        };
    }

    meta::advance(buf, header_len);
    let payload = meta::split_bytes(buf, parsed.content_length);

    ParseOutcome::Frame(Frame::new(
        SHttpMeta::Response {
            http_status,
            status: parsed.srpc_status.unwrap_or(0),
            data_type: parsed.data_type,
            compress_type: parsed.compress_type,
            module_data: parsed.module_data,
        },
        payload,
    ))
}

fn split_path(path: &str) -> Option<(String, String)> {
    let trimmed = path.strip_prefix('/')?;
    let (service, method) = trimmed.split_once('/')?;
    if service.is_empty() || method.is_empty() {
        return None;
    }
    Some((service.to_owned(), method.to_owned()))
}

#[cfg(test)]
mod tests {
    use bytes::{Bytes, BytesMut};

    use super::{SHttp, SHttpMeta};
    use crate::frame::{FrameCodec, ParseOutcome, DEFAULT_FRAME_CEILING};

    #[test]
    fn round_trips_a_request() {
        let meta = SHttpMeta::Request {
            service: "Echo".to_owned(),
            method: "Ping".to_owned(),
            data_type: 2,
            compress_type: 0,
            module_data: vec![("trace-id".to_owned(), "abc".to_owned())],
        };
        let payload = br#"{"message":"hi"}"#;
        let encoded = SHttp::encode(&meta, payload);

        let mut buf = BytesMut::from(&encoded[..]);
        match SHttp::decode(&mut buf, DEFAULT_FRAME_CEILING) {
            ParseOutcome::Frame(frame) => {
                assert_eq!(frame.meta, meta);
                assert_eq!(frame.payload, Bytes::from_static(payload));
            }
            other => panic!("expected a complete frame, got {other:?}"),
        }
    }

    #[test]
    fn round_trips_a_response_with_logical_error_status() {
        let meta = SHttpMeta::Response {
            http_status: 200,
            status: 9, // method-not-found
            data_type: 2,
            compress_type: 0,
            module_data: vec![],
        };
        let encoded = SHttp::encode(&meta, b"{}");
        let mut buf = BytesMut::from(&encoded[..]);
        match SHttp::decode(&mut buf, DEFAULT_FRAME_CEILING) {
            ParseOutcome::Frame(frame) => assert_eq!(frame.meta, meta),
            other => panic!("expected a complete frame, got {other:?}"),
        }
    }

    #[test]
    fn missing_compression_header_defaults_to_none() {
        let raw = b"POST /Echo/Ping HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: 2\r\n\r\n{}";
        let mut buf = BytesMut::from(&raw[..]);
        match SHttp::decode(&mut buf, DEFAULT_FRAME_CEILING) {
            ParseOutcome::Frame(frame) => match frame.meta {
                SHttpMeta::Request { compress_type, .. } => assert_eq!(compress_type, 0),
                other => panic!("expected a request, got {other:?}"),
            },
            other => panic!("expected a complete frame, got {other:?}"),
        }
    }

    #[test]
    fn unknown_compression_header_is_meta_error() {
        let raw = b"POST /Echo/Ping HTTP/1.1\r\nContent-Encoding: zstd\r\nContent-Length: 0\r\n\r\n";
        let mut buf = BytesMut::from(&raw[..]);
        match SHttp::decode(&mut buf, DEFAULT_FRAME_CEILING) {
            ParseOutcome::Error(err) => assert_eq!(err.kind, crate::frame::ProtocolErrorKind::MetaError),
            other => panic!("expected an error, got {other:?}"),
        }
    }

    #[test]
    fn incomplete_headers_need_more_bytes() {
        let raw = b"POST /Echo/Ping HTTP/1.1\r\nContent-Length: 5";
        let mut buf = BytesMut::from(&raw[..]);
        match SHttp::decode(&mut buf, DEFAULT_FRAME_CEILING) {
            ParseOutcome::NeedMoreBytes { needed } => assert_eq!(needed, 1),
            other => panic!("expected NeedMoreBytes, got {other:?}"),
        }
    }
}
