//! [`ClientTask`]: builds and runs one outbound call.
//!
//! Unlike the source's `create_<Method>_task(callback)` followed by a
//! `serialize_input` fill on a mutable out-param, Rust builds the typed
//! request value up front; a task is therefore created already bound to its
//! request rather than filled in after construction (see `DESIGN.md`).
//! `start()` still matches the source shape: it consumes the task, drives
//! begin-filters → transport → end-filters exactly once, and resolves with a
//! `(response, outcome)` pair — the future is the callback.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use polyrpc_codec::compress::{compress, decompress};
use polyrpc_codec::threshold::{should_compress, DEFAULT_COMPRESSION_THRESHOLD};
use polyrpc_net::protocol::RpcMeta;
use polyrpc_net::{ConnectionPool, Protocol};
use polyrpc_tower::{CallTimeouts, FilterChain};
use polyrpc_types::{CallStatus, CompressType, DataType, ModuleData};

/// Read-only per-call state the caller observes once a task resolves: the
/// client-side analogue of [`polyrpc_system::CallContext`].
#[derive(Debug, Clone)]
pub struct ClientCallOutcome {
    pub status: CallStatus,
    pub module_data: ModuleData,
    pub remote_addr: Option<SocketAddr>,
}

/// The `(response, sync-context)` pair a started task resolves to. `response`
/// is present only when `outcome.status.is_ok()`; every other field is always
/// populated, even on failure, so callers can inspect why a call failed.
#[derive(Debug, Clone)]
pub struct ClientCallResult<Resp> {
    pub response: Option<Resp>,
    pub outcome: ClientCallOutcome,
}

/// One outbound call, bound to its request and codec pair. Created by
/// [`crate::RpcClient::create_task`]; never started (dropped instead), it
/// leaks no resources, since it performs no I/O until [`Self::start`] runs.
pub struct ClientTask<Req, Resp, Enc, Dec, P: Protocol> {
    pub(crate) pool: Arc<ConnectionPool<P>>,
    pub(crate) filters: FilterChain,
    pub(crate) timeouts: CallTimeouts,
    pub(crate) retry_max: u32,
    pub(crate) correlation_id: u64,
    pub(crate) service: String,
    pub(crate) method: String,
    pub(crate) data_type: DataType,
    pub(crate) compress_type: CompressType,
    pub(crate) encode: Enc,
    pub(crate) decode: Dec,
    pub(crate) module_data: ModuleData,
    pub(crate) request: Req,
    pub(crate) _resp: std::marker::PhantomData<fn() -> Resp>,
}

impl<Req, Resp, Enc, Dec, P> ClientTask<Req, Resp, Enc, Dec, P>
where
    Enc: Fn(&Req, DataType) -> Result<Bytes, CallStatus> + Send + Sync,
    Dec: Fn(&[u8], DataType) -> Result<Resp, CallStatus> + Send + Sync,
    P: Protocol,
{
    /// Overrides the serializer tag negotiated for this call; defaults to
    /// the client's configured default.
    pub fn set_data_type(&mut self, data_type: DataType) {
        self.data_type = data_type;
    }

    /// Overrides the compressor tag negotiated for this call.
    pub fn set_compress_type(&mut self, compress_type: CompressType) {
        self.compress_type = compress_type;
    }

    /// Inserts a module-data entry (e.g. a trace id) visible to
    /// `server_begin` on the far end, in addition to whatever begin-filters
    /// add once the call starts.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` exceeds the module-data value size limit.
    pub fn insert_module_data(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), polyrpc_types::ModuleDataError> {
        self.module_data.insert(key, value).map(|_| ())
    }

    /// Enqueues the call: runs client-begin filters, the transport
    /// round-trip, and client-end filters, retrying idempotent failure kinds
    /// (connect failure, timeout before any bytes were written) up to the
    /// client's configured `retry_max`. Resolves exactly once, regardless of
    /// success, timeout, or retries exhausted.
    pub async fn start(self) -> ClientCallResult<Resp> {
        let mut result = self.attempt().await;
        let mut retries = 0;
        while retries < self.retry_max && is_retryable(result.outcome.status) {
            retries += 1;
            result = self.attempt().await;
        }
        result
    }

    async fn attempt(&self) -> ClientCallResult<Resp> {
        let mut module_data = self.module_data.clone();

        if !self.filters.run_client_begin(&mut module_data).await.proceeds() {
            self.filters.run_client_end(&mut module_data).await;
            return ClientCallResult {
                response: None,
                outcome: ClientCallOutcome {
                    status: CallStatus::MetaError,
                    module_data,
                    remote_addr: Some(self.pool.addr()),
                },
            };
        }

        let transport = self.timeouts.with_overall_deadline(self.round_trip(&module_data));
        let transport_result = match transport.await {
            Ok(result) => result,
            Err(status) => Err(status),
        };

        let (response, status, reply_module_data) = match transport_result {
            Ok((response, reply_module_data)) => (Some(response), CallStatus::Ok, reply_module_data),
            Err(status) => (None, status, ModuleData::new()),
        };
        module_data.extend_from(&reply_module_data);

        self.filters.run_client_end(&mut module_data).await;

        ClientCallResult {
            response,
            outcome: ClientCallOutcome {
                status,
                module_data,
                remote_addr: Some(self.pool.addr()),
            },
        }
    }

    async fn round_trip(&self, module_data: &ModuleData) -> Result<(Resp, ModuleData), CallStatus> {
        let request_bytes = (self.encode)(&self.request, self.data_type)?;

        let compress_type = if should_compress(request_bytes.len(), DEFAULT_COMPRESSION_THRESHOLD) {
            self.compress_type
        } else {
            CompressType::None
        };
        let body = compress(compress_type, &request_bytes).map_err(|_| CallStatus::RequestCompressFailed)?;

        let mut meta = RpcMeta::request(self.correlation_id, self.service.clone(), self.method.clone());
        meta.data_type = self.data_type;
        meta.compress_type = compress_type;
        meta.module_data = module_data.clone();

        let mut checkout = self.pool.checkout().await.map_err(|error| error.as_call_status())?;

        if let Err(error) = checkout.connection.write_frame(&meta, &body).await {
            // The connection is in an unknown state after a failed write;
            // drop it instead of returning it to the idle queue.
            return Err(error.as_call_status());
        }

        let read = checkout.connection.read_frame().await;
        let (reply_meta, payload) = match read {
            Ok(Some(frame)) => frame,
            Ok(None) => return Err(CallStatus::UpstreamFailed),
            Err(error) => return Err(error.as_call_status()),
        };

        // The round trip itself succeeded; the connection is reusable
        // regardless of whether the payload below decodes cleanly.
        self.pool.checkin(checkout).await;

        if reply_meta.correlation_id != 0 && reply_meta.correlation_id != self.correlation_id {
            return Err(CallStatus::ResponseParseFailed);
        }

        if reply_meta.status != CallStatus::Ok {
            return Err(reply_meta.status);
        }

        let decompressed = decompress(reply_meta.compress_type, &payload, 0)
            .map_err(|_| CallStatus::ResponseDecompressFailed)?;
        let response = (self.decode)(&decompressed, reply_meta.data_type)?;

        Ok((response, reply_meta.module_data))
    }
}

/// Per §7: system and protocol errors are retried for idempotent failure
/// kinds — connect failures and timeouts before any bytes were written.
/// [`polyrpc_net::Connection::write_frame`] writes a whole frame in one
/// `write_all`, so a write failure here never leaves a partial frame on the
/// wire for this framework to reason about; both failure kinds are folded
/// into the same two statuses.
fn is_retryable(status: CallStatus) -> bool {
    matches!(status, CallStatus::RequestSendFailed | CallStatus::ResponseTimeout)
}

#[cfg(test)]
mod tests {
    use polyrpc_net::protocol::SBinProtocol;
    use polyrpc_types::{CallStatus, DataType};

    use super::ClientTask;
    use crate::{ClientConfig, RpcClient};

    fn encode_text(value: &String, _tag: DataType) -> Result<bytes::Bytes, CallStatus> {
        Ok(bytes::Bytes::copy_from_slice(value.as_bytes()))
    }

    fn decode_text(bytes: &[u8], _tag: DataType) -> Result<String, CallStatus> {
        std::str::from_utf8(bytes).map(str::to_owned).map_err(|_| CallStatus::MetaError)
    }

    #[tokio::test]
    async fn connect_failure_against_a_closed_port_surfaces_as_request_send_failed() {
        let addr: std::net::SocketAddr = "127.0.0.1:1".parse().unwrap();
        let client: RpcClient<SBinProtocol> = RpcClient::connect(addr, ClientConfig::default());

        let task: ClientTask<_, String, _, _, _> =
            client.create_task("greeter", "hello", encode_text, decode_text, "world".to_owned());
        let result = task.start().await;
        assert!(result.response.is_none());
        assert_eq!(result.outcome.status, CallStatus::RequestSendFailed);
    }
}
