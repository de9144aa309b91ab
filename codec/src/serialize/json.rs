//! The `text-json` payload serializer, backed directly by `serde_json`.

use bytes::Bytes;
use error_stack::{Report, ResultExt};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::SerializationError;

const CODEC: &str = "json";

/// # Errors
///
/// Returns [`SerializationError::Encode`] if `value` cannot be represented as JSON.
pub fn to_bytes<T: Serialize>(value: &T) -> Result<Bytes, Report<SerializationError>> {
    let vec = serde_json::to_vec(value).change_context(SerializationError::Encode { codec: CODEC })?;
    Ok(Bytes::from(vec))
}

/// # Errors
///
/// Returns [`SerializationError::Decode`] if `bytes` is not valid JSON for `T`.
pub fn from_slice<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, Report<SerializationError>> {
    serde_json::from_slice(bytes).change_context(SerializationError::Decode { codec: CODEC })
}

#[cfg(test)]
mod tests {
    use super::{from_slice, to_bytes};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Echo {
        message: String,
        idx: Option<u32>,
    }

    #[test]
    fn round_trips_struct_with_optional_field() {
        let value = Echo {
            message: "hi".to_owned(),
            idx: None,
        };
        let bytes = to_bytes(&value).expect("encode succeeds");
        let decoded: Echo = from_slice(&bytes).expect("decode succeeds");
        assert_eq!(decoded, value);
    }

    #[test]
    fn rejects_malformed_json() {
        let err = from_slice::<Echo>(b"not json").unwrap_err();
        assert!(err.to_string().contains("decode"));
    }
}
