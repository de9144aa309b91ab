//! The protocol-adapter abstraction: instead of one type per
//! `(protocol × schema)`, one client/server struct is parameterized by a
//! protocol adapter chosen at construction or compile time.
//!
//! The five wire protocols in `polyrpc_wire` disagree on what their meta
//! carries: [`CommonMeta`] (S-bin, B-bin, Tr-bin) has a correlation id,
//! status, and module-data; [`ThriftMeta`] has none of those; [`SHttpMeta`]
//! splits request and response into separate variants. Rather than writing
//! `Connection<SBin>`, `Connection<BBin>`, ... by hand with duplicated glue,
//! every [`Protocol`] impl converts its native meta to and from one
//! [`RpcMeta`] the rest of this crate (and `polyrpc-client`/`polyrpc-server`)
//! is written against.

use bytes::Bytes;
use polyrpc_types::{CallStatus, CompressType, DataType, ModuleData};
use polyrpc_wire::proto::{
    BBin, CommonMeta, SBin, SHttp, SHttpMeta, TBin, ThriftMeta, ThriftMessageType, TrBin, TrBinMeta,
};

/// Tr-bin's `frame_type` byte is opaque to the parser (see [`TrBinMeta`]);
/// this crate always writes 0 and never reads it back.
const TR_BIN_FRAME_TYPE: u8 = 0;
use polyrpc_wire::frame::FrameCodec;

/// The wire-agnostic projection of one protocol's meta, used by
/// [`crate::connection::Connection`] so dispatch/client code never matches on
/// which of the five protocols is in play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcMeta {
    pub correlation_id: u64,
    pub service: String,
    pub method: String,
    pub data_type: DataType,
    pub compress_type: CompressType,
    pub status: CallStatus,
    pub module_data: ModuleData,
    pub attachment: Option<Bytes>,
}

impl RpcMeta {
    #[must_use]
    pub fn request(correlation_id: u64, service: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            correlation_id,
            service: service.into(),
            method: method.into(),
            data_type: DataType::TextJson,
            compress_type: CompressType::None,
            status: CallStatus::Ok,
            module_data: ModuleData::new(),
            attachment: None,
        }
    }

    /// Mirrors `CommonMeta::reply` (wire/src/proto/meta.rs): a reply carries
    /// no service/method of its own, only the correlation id and status. This
    /// is safe for `CommonMeta`-backed protocols, whose clients never read a
    /// reply's service/method, and it is load-bearing for S-http, where
    /// [`SHttpProtocol::from_rpc_meta`] keys the request-vs-response framing
    /// decision on whether service/method are empty.
    #[must_use]
    pub fn reply_to(&self, status: CallStatus) -> Self {
        Self {
            correlation_id: self.correlation_id,
            service: String::new(),
            method: String::new(),
            data_type: self.data_type,
            compress_type: self.compress_type,
            status,
            module_data: ModuleData::new(),
            attachment: None,
        }
    }
}

fn module_data_from_pairs(pairs: &[(String, String)]) -> ModuleData {
    pairs.iter().cloned().collect()
}

fn module_data_to_pairs(data: &ModuleData) -> Vec<(String, String)> {
    data.iter().map(|(key, value)| (key.to_owned(), value.to_owned())).collect()
}

/// A wire protocol paired with its [`RpcMeta`] projection, plugged into
/// [`crate::connection::Connection<S, P>`] to make connection/client/server
/// code generic over all five protocols.
pub trait Protocol: Send + Sync + 'static {
    type Codec: FrameCodec;

    /// A short, stable name used in connection/call span fields, recorded on
    /// the span opened per accepted connection.
    const NAME: &'static str;

    fn to_rpc_meta(meta: &<Self::Codec as FrameCodec>::Meta) -> RpcMeta;
    fn from_rpc_meta(meta: &RpcMeta) -> <Self::Codec as FrameCodec>::Meta;
}

/// S-bin: `CommonMeta` carries every `RpcMeta` field directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct SBinProtocol;

impl Protocol for SBinProtocol {
    type Codec = SBin;

    const NAME: &'static str = "s-bin";

    fn to_rpc_meta(meta: &CommonMeta) -> RpcMeta {
        common_meta_to_rpc(meta)
    }

    fn from_rpc_meta(meta: &RpcMeta) -> CommonMeta {
        rpc_meta_to_common(meta)
    }
}

/// B-bin: identical meta shape to S-bin, different framing.
#[derive(Debug, Clone, Copy, Default)]
pub struct BBinProtocol;

impl Protocol for BBinProtocol {
    type Codec = BBin;

    const NAME: &'static str = "b-bin";

    fn to_rpc_meta(meta: &CommonMeta) -> RpcMeta {
        common_meta_to_rpc(meta)
    }

    fn from_rpc_meta(meta: &RpcMeta) -> CommonMeta {
        rpc_meta_to_common(meta)
    }
}

/// Tr-bin: `CommonMeta` nested inside a frame-type byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrBinProtocol;

impl Protocol for TrBinProtocol {
    type Codec = TrBin;

    const NAME: &'static str = "tr-bin";

    fn to_rpc_meta(meta: &TrBinMeta) -> RpcMeta {
        common_meta_to_rpc(&meta.common)
    }

    fn from_rpc_meta(meta: &RpcMeta) -> TrBinMeta {
        TrBinMeta::new(TR_BIN_FRAME_TYPE, rpc_meta_to_common(meta))
    }
}

fn common_meta_to_rpc(meta: &CommonMeta) -> RpcMeta {
    RpcMeta {
        correlation_id: meta.correlation_id,
        service: meta.service.clone(),
        method: meta.method.clone(),
        data_type: DataType::from_u8(meta.data_type).unwrap_or(DataType::TextJson),
        compress_type: CompressType::from_u8(meta.compress_type).unwrap_or(CompressType::None),
        status: CallStatus::from_u16(meta.status),
        module_data: module_data_from_pairs(&meta.module_data),
        attachment: meta.attachment.clone(),
    }
}

fn rpc_meta_to_common(meta: &RpcMeta) -> CommonMeta {
    CommonMeta {
        correlation_id: meta.correlation_id,
        data_type: meta.data_type.as_u8(),
        compress_type: meta.compress_type.as_u8(),
        status: meta.status.as_u16(),
        service: meta.service.clone(),
        method: meta.method.clone(),
        module_data: module_data_to_pairs(&meta.module_data),
        attachment: meta.attachment.clone(),
    }
}

/// T-bin: Thrift's classic envelope has no status, compression, or
/// module-data slots. T-bin always uses schema-B-binary, uncompressed.
/// `seqid` doubles as the correlation id; a non-zero
/// `message_type` of `Exception` is the only status this protocol can convey,
/// mapped to [`CallStatus::UndefinedError`] since the original exception
/// detail does not survive the envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct TBinProtocol;

impl Protocol for TBinProtocol {
    type Codec = TBin;

    const NAME: &'static str = "t-bin";

    fn to_rpc_meta(meta: &ThriftMeta) -> RpcMeta {
        let status = if meta.message_type == ThriftMessageType::Exception.as_i8() {
            CallStatus::UndefinedError
        } else {
            CallStatus::Ok
        };
        RpcMeta {
            correlation_id: meta.seqid as u64,
            service: String::new(),
            method: meta.method.clone(),
            data_type: DataType::SchemaBBinary,
            compress_type: CompressType::None,
            status,
            module_data: ModuleData::new(),
            attachment: None,
        }
    }

    fn from_rpc_meta(meta: &RpcMeta) -> ThriftMeta {
        if meta.status == CallStatus::Ok {
            ThriftMeta::reply(meta.method.clone(), meta.correlation_id as i32)
        } else {
            ThriftMeta::exception(meta.method.clone(), meta.correlation_id as i32)
        }
    }
}

/// S-http: request/response is an enum rather than one struct; correlation
/// id has no wire representation (HTTP/1.1 request/response pairing on one
/// connection is inherently FIFO), so it is always reported as 0 and
/// ignored by [`crate::connection::Connection`] for this protocol.
#[derive(Debug, Clone, Copy, Default)]
pub struct SHttpProtocol;

impl Protocol for SHttpProtocol {
    type Codec = SHttp;

    const NAME: &'static str = "s-http";

    fn to_rpc_meta(meta: &SHttpMeta) -> RpcMeta {
        match meta {
            SHttpMeta::Request {
                service,
                method,
                data_type,
                compress_type,
                module_data,
            } => RpcMeta {
                correlation_id: 0,
                service: service.clone(),
                method: method.clone(),
                data_type: DataType::from_u8(*data_type).unwrap_or(DataType::TextJson),
                compress_type: CompressType::from_u8(*compress_type).unwrap_or(CompressType::None),
                status: CallStatus::Ok,
                module_data: module_data_from_pairs(module_data),
                attachment: None,
            },
            SHttpMeta::Response {
                status,
                data_type,
                compress_type,
                module_data,
                ..
            } => RpcMeta {
                correlation_id: 0,
                service: String::new(),
                method: String::new(),
                data_type: DataType::from_u8(*data_type).unwrap_or(DataType::TextJson),
                compress_type: CompressType::from_u8(*compress_type).unwrap_or(CompressType::None),
                status: CallStatus::from_u16(*status),
                module_data: module_data_from_pairs(module_data),
                attachment: None,
            },
        }
    }

    fn from_rpc_meta(meta: &RpcMeta) -> SHttpMeta {
        if meta.service.is_empty() && meta.method.is_empty() {
            SHttpMeta::Response {
                http_status: 200,
                status: meta.status.as_u16(),
                data_type: meta.data_type.as_u8(),
                compress_type: meta.compress_type.as_u8(),
                module_data: module_data_to_pairs(&meta.module_data),
            }
        } else {
            SHttpMeta::Request {
                service: meta.service.clone(),
                method: meta.method.clone(),
                data_type: meta.data_type.as_u8(),
                compress_type: meta.compress_type.as_u8(),
                module_data: module_data_to_pairs(&meta.module_data),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use polyrpc_types::{CallStatus, DataType};

    use super::{Protocol, RpcMeta, SBinProtocol, SHttpProtocol, TBinProtocol};

    #[test]
    fn s_bin_round_trips_through_rpc_meta() {
        let mut meta = RpcMeta::request(7, "Greeter", "Hello");
        meta.data_type = DataType::SchemaABinary;
        meta.module_data.insert("trace-id", "abc").expect("fits");

        let wire = SBinProtocol::from_rpc_meta(&meta);
        let back = SBinProtocol::to_rpc_meta(&wire);
        assert_eq!(back, meta);
    }

    #[test]
    fn t_bin_exception_maps_to_undefined_error_status() {
        let meta = RpcMeta {
            status: CallStatus::UndefinedError,
            ..RpcMeta::request(1, "", "Add")
        };
        let wire = TBinProtocol::from_rpc_meta(&meta);
        let back = TBinProtocol::to_rpc_meta(&wire);
        assert_eq!(back.status, CallStatus::UndefinedError);
    }

    #[test]
    fn s_http_request_vs_response_is_distinguished_by_service_name() {
        let request = RpcMeta::request(0, "Greeter", "Hello");
        let wire = SHttpProtocol::from_rpc_meta(&request);
        assert!(matches!(wire, polyrpc_wire::proto::SHttpMeta::Request { .. }));

        let reply = request.reply_to(CallStatus::Ok);
        let wire = SHttpProtocol::from_rpc_meta(&reply);
        assert!(matches!(wire, polyrpc_wire::proto::SHttpMeta::Response { .. }));
    }
}
