//! Server parameters: constructed with max-connections, request-size-limit,
//! and keep-alive-timeout.

use std::time::Duration;

use polyrpc_net::ConnectionLimits;
use serde::{Deserialize, Serialize};

/// Server-side connection and drain parameters.
///
/// `Default` mirrors [`ConnectionLimits::default`] for the connection-level
/// fields, plus a 30 s deadline for [`crate::facade::RpcServer::stop`] to
/// drain in-flight calls before forcing connections closed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ServerConfig {
    pub connection_limits: ConnectionLimits,
    #[serde(with = "duration_millis")]
    pub stop_drain_deadline: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            connection_limits: ConnectionLimits::default(),
            stop_drain_deadline: Duration::from_secs(30),
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

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::ServerConfig;

    #[test]
    fn defaults_drain_for_thirty_seconds() {
        let config = ServerConfig::default();
        assert_eq!(config.stop_drain_deadline, Duration::from_secs(30));
    }

    #[test]
    fn round_trips_through_json() {
        let config = ServerConfig {
            stop_drain_deadline: Duration::from_secs(5),
            ..ServerConfig::default()
        };
        let json = serde_json::to_string(&config).expect("serializes");
        let decoded: ServerConfig = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(decoded.stop_drain_deadline, config.stop_drain_deadline);
    }
}
