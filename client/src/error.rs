//! Client-facing error taxonomy.
//!
//! [`CodecError`] alone cannot tell a request-side failure from a
//! response-side one (the same [`polyrpc_codec`] codecs run in both
//! directions), so this type splits on direction explicitly rather than
//! folding both into one `#[from]` impl the way [`TransportError`] does.

use polyrpc_codec::CodecError;
use polyrpc_net::TransportError;
use polyrpc_types::CallStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("failed to prepare the outbound payload")]
    RequestCodec(#[source] CodecError),
    #[error("failed to read the inbound payload")]
    ResponseCodec(#[source] CodecError),
}

impl ClientError {
    #[must_use]
    pub fn as_call_status(&self) -> CallStatus {
        match self {
            Self::Transport(error) => error.as_call_status(),
            Self::RequestCodec(CodecError::Serialization(_)) => CallStatus::RequestEncodeFailed,
            Self::RequestCodec(CodecError::Compression(_)) => CallStatus::RequestCompressFailed,
            Self::ResponseCodec(CodecError::Serialization(_)) => CallStatus::ResponseDecodeFailed,
            Self::ResponseCodec(CodecError::Compression(_)) => CallStatus::ResponseDecompressFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use polyrpc_codec::error::SerializationError;
    use polyrpc_codec::CodecError;
    use polyrpc_types::CallStatus;

    use super::ClientError;

    #[test]
    fn request_side_serialization_failure_maps_to_request_encode_failed() {
        let error = ClientError::RequestCodec(CodecError::Serialization(SerializationError::Message("bad".to_owned())));
        assert_eq!(error.as_call_status(), CallStatus::RequestEncodeFailed);
    }

    #[test]
    fn response_side_serialization_failure_maps_to_response_decode_failed() {
        let error = ClientError::ResponseCodec(CodecError::Serialization(SerializationError::Message("bad".to_owned())));
        assert_eq!(error.as_call_status(), CallStatus::ResponseDecodeFailed);
    }
}
