//! Client parameters: constructed from `(host, port | URL, params)`,
//! independent of any file format.

use std::time::Duration;

use polyrpc_net::ConnectionLimits;
use polyrpc_types::{CompressType, DataType};
use serde::{Deserialize, Serialize};

/// Client-side connection and retry parameters.
///
/// `Default` is a 5 s connect timeout, a 30 s overall response timeout, no
/// retries, and keep-alive disabled (`None`; a `-1` wire value disables it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub connection_limits: ConnectionLimits,
    #[serde(with = "duration_millis")]
    pub connect_timeout: Duration,
    #[serde(with = "duration_millis")]
    pub response_timeout: Duration,
    #[serde(with = "duration_option_millis")]
    pub keep_alive_timeout: Option<Duration>,
    /// Count-bounded retry for idempotent failure kinds: connect failures and
    /// timeouts before any bytes were written.
    pub retry_max: u32,
    pub default_data_type: DataType,
    pub default_compress_type: CompressType,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connection_limits: ConnectionLimits::default(),
            connect_timeout: Duration::from_secs(5),
            response_timeout: Duration::from_secs(30),
            keep_alive_timeout: None,
            retry_max: 0,
            default_data_type: DataType::TextJson,
            default_compress_type: CompressType::None,
        }
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

mod duration_option_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        value.map(|duration| duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::ClientConfig;

    #[test]
    fn defaults_disable_keep_alive_and_retries() {
        let config = ClientConfig::default();
        assert_eq!(config.keep_alive_timeout, None);
        assert_eq!(config.retry_max, 0);
    }
}
