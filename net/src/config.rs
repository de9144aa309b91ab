//! Connection-level configuration shared by pooled clients and listening
//! servers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Resource limits applied to one client pool or one server listener.
///
/// `Default` is a 64 MiB frame ceiling and no idle keep-alive cutoff (a `-1`
/// wire value disables keep-alive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionLimits {
    /// Accept is paused once this many connections are open.
    pub max_connections: usize,
    /// Meta/payload length ceiling enforced by every [`polyrpc_wire::FrameCodec`].
    pub frame_ceiling: usize,
    /// Idle duration after which a keep-alive connection is closed; `None`
    /// disables the idle timeout entirely.
    #[serde(with = "duration_option_millis")]
    pub keep_alive_idle: Option<Duration>,
}

impl Default for ConnectionLimits {
    fn default() -> Self {
        Self {
            max_connections: 1024,
            frame_ceiling: polyrpc_wire::frame::DEFAULT_FRAME_CEILING,
            keep_alive_idle: None,
        }
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
