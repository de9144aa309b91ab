//! Transport-level errors: the "System" and "Protocol" error classes.
//!
//! [`TransportError::as_call_status`] is the conversion every internal error
//! implements down to the wire-visible [`CallStatus`].

use std::io;

use polyrpc_types::CallStatus;
use polyrpc_wire::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect failed")]
    Connect(#[source] io::Error),
    #[error("read failed")]
    Read(#[source] io::Error),
    #[error("write failed")]
    Write(#[source] io::Error),
    #[error("connection closed by peer")]
    ConnectionClosed,
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("deadline elapsed waiting on {0}")]
    Timeout(&'static str),
    #[error("connection pool exhausted ({max_connections} connections in use)")]
    PoolExhausted { max_connections: usize },
}

impl TransportError {
    #[must_use]
    pub fn as_call_status(&self) -> CallStatus {
        match self {
            Self::Connect(_) | Self::PoolExhausted { .. } => CallStatus::RequestSendFailed,
            Self::Read(_) | Self::ConnectionClosed => CallStatus::UpstreamFailed,
            Self::Write(_) => CallStatus::RequestSendFailed,
            Self::Protocol(error) => match error.kind {
                polyrpc_wire::ProtocolErrorKind::BadMagic | polyrpc_wire::ProtocolErrorKind::Malformed => {
                    CallStatus::ResponseParseFailed
                }
                polyrpc_wire::ProtocolErrorKind::Oversized => CallStatus::ResponseParseFailed,
                polyrpc_wire::ProtocolErrorKind::MetaError => CallStatus::MetaError,
            },
            Self::Timeout(_) => CallStatus::ResponseTimeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use polyrpc_types::CallStatus;
    use polyrpc_wire::{ProtocolError, ProtocolErrorKind};

    use super::TransportError;

    #[test]
    fn bad_magic_maps_to_response_parse_failed() {
        let error = TransportError::Protocol(ProtocolError::new(ProtocolErrorKind::BadMagic, "bad"));
        assert_eq!(error.as_call_status(), CallStatus::ResponseParseFailed);
    }

    #[test]
    fn meta_error_maps_to_meta_error_status() {
        let error = TransportError::Protocol(ProtocolError::new(ProtocolErrorKind::MetaError, "bad"));
        assert_eq!(error.as_call_status(), CallStatus::MetaError);
    }
}
