//! The call-status enumeration: the primary RPC-level error surface.

use core::fmt;

/// Outcome of a single RPC call, carried in reply meta on every protocol.
///
/// `Ok` is the only status indicating the payload is trustworthy; every other
/// variant means the response body (if any) must be ignored by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum CallStatus {
    Ok,
    UndefinedError,
    RequestEncodeFailed,
    RequestCompressFailed,
    RequestSendFailed,
    ResponseTimeout,
    ResponseParseFailed,
    ResponseDecompressFailed,
    ResponseDecodeFailed,
    MethodNotFound,
    ServiceNotFound,
    MetaError,
    UriInvalid,
    UpstreamFailed,
}

impl CallStatus {
    /// Whether this status represents a successful call whose payload may be trusted.
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// The numeric tag used to carry this status across the wire.
    ///
    /// Kept stable once assigned: these values are persisted in flight on every
    /// protocol's meta encoding, so renumbering would be a wire-breaking change.
    #[must_use]
    pub fn as_u16(self) -> u16 {
        match self {
            Self::Ok => 0,
            Self::UndefinedError => 1,
            Self::RequestEncodeFailed => 2,
            Self::RequestCompressFailed => 3,
            Self::RequestSendFailed => 4,
            Self::ResponseTimeout => 5,
            Self::ResponseParseFailed => 6,
            Self::ResponseDecompressFailed => 7,
            Self::ResponseDecodeFailed => 8,
            Self::MethodNotFound => 9,
            Self::ServiceNotFound => 10,
            Self::MetaError => 11,
            Self::UriInvalid => 12,
            Self::UpstreamFailed => 13,
        }
    }

    /// Recovers a status from its wire tag.
    ///
    /// Unknown tags decode as [`CallStatus::UndefinedError`] rather than failing,
    /// since a status we don't recognise is itself evidence something went wrong,
    /// not a reason to fail parsing the rest of the frame.
    #[must_use]
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => Self::Ok,
            2 => Self::RequestEncodeFailed,
            3 => Self::RequestCompressFailed,
            4 => Self::RequestSendFailed,
            5 => Self::ResponseTimeout,
            6 => Self::ResponseParseFailed,
            7 => Self::ResponseDecompressFailed,
            8 => Self::ResponseDecodeFailed,
            9 => Self::MethodNotFound,
            10 => Self::ServiceNotFound,
            11 => Self::MetaError,
            12 => Self::UriInvalid,
            13 => Self::UpstreamFailed,
            _ => Self::UndefinedError,
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "ok",
            Self::UndefinedError => "undefined-error",
            Self::RequestEncodeFailed => "request-encode-failed",
            Self::RequestCompressFailed => "request-compress-failed",
            Self::RequestSendFailed => "request-send-failed",
            Self::ResponseTimeout => "response-timeout",
            Self::ResponseParseFailed => "response-parse-failed",
            Self::ResponseDecompressFailed => "response-decompress-failed",
            Self::ResponseDecodeFailed => "response-decode-failed",
            Self::MethodNotFound => "method-not-found",
            Self::ServiceNotFound => "service-not-found",
            Self::MetaError => "meta-error",
            Self::UriInvalid => "uri-invalid",
            Self::UpstreamFailed => "upstream-failed",
        };
        f.write_str(name)
    }
}

impl Default for CallStatus {
    fn default() -> Self {
        Self::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::CallStatus;

    #[test]
    fn round_trips_through_wire_tag() {
        let statuses = [
            CallStatus::Ok,
            CallStatus::UndefinedError,
            CallStatus::RequestEncodeFailed,
            CallStatus::RequestCompressFailed,
            CallStatus::RequestSendFailed,
            CallStatus::ResponseTimeout,
            CallStatus::ResponseParseFailed,
            CallStatus::ResponseDecompressFailed,
            CallStatus::ResponseDecodeFailed,
            CallStatus::MethodNotFound,
            CallStatus::ServiceNotFound,
            CallStatus::MetaError,
            CallStatus::UriInvalid,
            CallStatus::UpstreamFailed,
        ];

        for status in statuses {
            assert_eq!(CallStatus::from_u16(status.as_u16()), status);
        }
    }

    #[test]
    fn unknown_tag_decodes_as_undefined_error() {
        assert_eq!(CallStatus::from_u16(0xFFFF), CallStatus::UndefinedError);
    }

    #[test]
    fn only_ok_reports_is_ok() {
        assert!(CallStatus::Ok.is_ok());
        assert!(!CallStatus::UndefinedError.is_ok());
    }
}
