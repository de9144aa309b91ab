//! Codec-pair convenience for [`crate::RpcClient::create_task`], mirroring
//! `polyrpc_system::stub::{codec_decoder, codec_encoder}` on the server side:
//! a generated client would normally supply its own `encode`/`decode`
//! closures bound to the schema compiler's output, but for any `T` that is
//! plain `serde::Serialize`/`DeserializeOwned`, these defer to the same
//! negotiated-[`DataType`] codec the server side uses.

use bytes::Bytes;
use polyrpc_codec::error::{CodecError, SerializationError};
use polyrpc_types::{CallStatus, DataType};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ClientError;

/// An `encode` argument for [`crate::RpcClient::create_task`] that serializes
/// `T` with whatever codec the call's negotiated [`DataType`] selects.
///
/// # Errors
///
/// Returns the [`CallStatus`] [`ClientError::as_call_status`] maps a
/// [`CodecError::Serialization`] failure to.
pub fn codec_encoder<T>() -> impl Fn(&T, DataType) -> Result<Bytes, CallStatus> + Clone
where
    T: Serialize,
{
    |value, tag| {
        polyrpc_codec::serialize::encode(tag, value).map_err(|report| {
            let error = CodecError::Serialization(SerializationError::Message(report.to_string()));
            ClientError::RequestCodec(error).as_call_status()
        })
    }
}

/// The `decode` counterpart to [`codec_encoder`].
///
/// # Errors
///
/// Returns the [`CallStatus`] [`ClientError::as_call_status`] maps a
/// [`CodecError::Serialization`] failure to.
pub fn codec_decoder<T>() -> impl Fn(&[u8], DataType) -> Result<T, CallStatus> + Clone
where
    T: DeserializeOwned,
{
    |bytes, tag| {
        polyrpc_codec::serialize::decode(tag, bytes).map_err(|report| {
            let error = CodecError::Serialization(SerializationError::Message(report.to_string()));
            ClientError::ResponseCodec(error).as_call_status()
        })
    }
}
