//! The decode → filter → invoke → encode pipeline run for one accepted
//! request.
//!
//! Unlike [`polyrpc_tower::FilterService`] (modeled around a client's single
//! network round-trip), dispatch runs directly against
//! [`CallContext`]'s shared module-data: the network read already happened
//! by the time this function is called, and the handler needs to observe
//! exactly the same module-data storage the begin-filters populated.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use polyrpc_codec::compress::{compress, decompress};
use polyrpc_codec::threshold::{should_compress, DEFAULT_COMPRESSION_THRESHOLD};
use polyrpc_net::protocol::RpcMeta;
use polyrpc_system::{CallContext, MethodStub, ServiceRegistry};
use polyrpc_tower::{CallTimeouts, CancelToken, FilterChain};
use polyrpc_types::{CallStatus, CompressType};
use tracing::{info_span, warn, Instrument as _};

/// Runs one request to completion and returns the reply `(meta, payload)`.
/// Never propagates an error: every failure mode this framework recognizes
/// (missing method, bad compression, filter rejection, handler panic,
/// overall timeout) is folded into a [`CallStatus`] carried in the returned
/// meta, so the caller can always write a reply frame.
pub async fn dispatch(
    registry: &ServiceRegistry,
    filters: &FilterChain,
    timeouts: &CallTimeouts,
    meta: RpcMeta,
    payload: Bytes,
    remote_addr: Option<SocketAddr>,
) -> (RpcMeta, Bytes) {
    let span = info_span!(
        "rpc_call",
        service = %meta.service,
        method = %meta.method,
        correlation_id = meta.correlation_id,
    );
    dispatch_inner(registry, filters, timeouts, meta, payload, remote_addr)
        .instrument(span)
        .await
}

async fn dispatch_inner(
    registry: &ServiceRegistry,
    filters: &FilterChain,
    timeouts: &CallTimeouts,
    meta: RpcMeta,
    payload: Bytes,
    remote_addr: Option<SocketAddr>,
) -> (RpcMeta, Bytes) {
    let Some(stub) = registry.lookup(&meta.service, &meta.method) else {
        let status = if registry.contains_service(&meta.service) {
            CallStatus::MethodNotFound
        } else {
            CallStatus::ServiceNotFound
        };
        warn!(%status, "dispatch miss");
        return (meta.reply_to(status), Bytes::new());
    };

    let payload = match decompress(meta.compress_type, &payload, 0) {
        Ok(payload) => payload,
        Err(report) => {
            warn!(error = ?report, "inbound payload failed to decompress");
            return (meta.reply_to(CallStatus::ResponseDecompressFailed), Bytes::new());
        }
    };

    let mut module_data = meta.module_data.clone();
    if !filters.run_server_begin(&mut module_data).await.proceeds() {
        filters.run_server_end(&mut module_data).await;
        return (meta.reply_to(CallStatus::MetaError), Bytes::new());
    }

    let ctx = CallContext::new(meta.data_type, remote_addr);
    ctx.set_module_data(module_data);

    let result = timeouts
        .with_overall_deadline(async {
            let response_payload = run_stub(stub, payload, ctx.clone()).await?;
            // A handler that deferred its reply appended a subtask to its own
            // series (e.g. a nested call, a timer) instead of returning
            // immediately; the reply is scheduled only after that subtask
            // completes, still bounded by this same overall deadline.
            if !ctx.series().is_empty() {
                ctx.series().run(&CancelToken::new()).await;
            }
            Ok(response_payload)
        })
        .await
        .and_then(std::convert::identity);

    let mut module_data = ctx.module_data();
    filters.run_server_end(&mut module_data).await;

    match result {
        Ok(response_payload) => {
            let compress_type = if should_compress(response_payload.len(), DEFAULT_COMPRESSION_THRESHOLD) {
                ctx.reply_compress_type()
            } else {
                CompressType::None
            };
            let body = match compress(compress_type, &response_payload) {
                Ok(body) => body,
                Err(report) => {
                    warn!(error = ?report, "reply payload failed to compress");
                    return (meta.reply_to(CallStatus::RequestCompressFailed), Bytes::new());
                }
            };

            let mut reply_meta = meta.reply_to(ctx.status());
            reply_meta.data_type = ctx.reply_data_type();
            reply_meta.compress_type = compress_type;
            reply_meta.module_data = module_data;
            (reply_meta, body)
        }
        Err(status) => {
            let mut reply_meta = meta.reply_to(status);
            reply_meta.module_data = module_data;
            (reply_meta, Bytes::new())
        }
    }
}

/// Runs the stub on its own task so a handler panic is isolated to this one
/// call rather than bringing down the connection's task: a handler panic
/// completes the call with undefined-error and keeps the server alive.
async fn run_stub(stub: Arc<dyn MethodStub>, payload: Bytes, ctx: CallContext) -> Result<Bytes, CallStatus> {
    match tokio::spawn(async move { stub.call(payload, ctx).await }).await {
        Ok(result) => result,
        Err(join_error) => {
            warn!(error = %join_error, "handler panicked");
            Err(CallStatus::UndefinedError)
        }
    }
}
