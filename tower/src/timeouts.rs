//! Per-call timeouts.

use std::future::Future;
use std::time::Duration;

use polyrpc_types::CallStatus;

/// The three timeouts carried by every call. `keep_alive_idle` is `None`
/// when disabled (a `-1` wire sentinel becomes `Option::None` here).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallTimeouts {
    pub send: Duration,
    pub keep_alive_idle: Option<Duration>,
    pub overall: Duration,
}

impl Default for CallTimeouts {
    fn default() -> Self {
        Self {
            send: Duration::from_secs(5),
            keep_alive_idle: Some(Duration::from_secs(60)),
            overall: Duration::from_secs(30),
        }
    }
}

impl CallTimeouts {
    #[must_use]
    pub fn disabled_keep_alive(mut self) -> Self {
        self.keep_alive_idle = None;
        self
    }

    /// Runs `future` under the overall deadline, translating elapse into the
    /// wire-visible [`CallStatus::ResponseTimeout`].
    pub async fn with_overall_deadline<F, T>(&self, future: F) -> Result<T, CallStatus>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout(self.overall, future)
            .await
            .map_err(|_elapsed| CallStatus::ResponseTimeout)
    }
}
