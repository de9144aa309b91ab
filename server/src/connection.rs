//! Per-connection serving loop: the server task accepts one inbound call at
//! a time and dispatches it to a user-supplied handler.
//!
//! [`Connection<S, P>`](polyrpc_net::Connection) owns its stream as one
//! unsplit value, so requests on a single connection are served strictly
//! sequentially: read a frame, dispatch it, write the reply, repeat. That
//! satisfies every protocol's FIFO wire shape and S-http's inherent
//! request/response pairing; true interleaved pipelining across outstanding
//! requests on one keep-alive connection (distinct connections already run
//! fully concurrently, one task each) is future work.

use std::net::SocketAddr;
use std::sync::Arc;

use polyrpc_net::{Connection, ConnectionLimits, Protocol};
use polyrpc_system::ServiceRegistry;
use polyrpc_tower::{CallTimeouts, FilterChain};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info_span, warn, Instrument as _};

use crate::dispatch::dispatch;

/// Serves one accepted connection until a clean EOF, an idle timeout, or a
/// transport error closes it.
pub async fn serve_connection<S, P>(
    mut connection: Connection<S, P>,
    peer_addr: Option<SocketAddr>,
    registry: Arc<ServiceRegistry>,
    filters: Arc<FilterChain>,
    timeouts: CallTimeouts,
    limits: ConnectionLimits,
) where
    S: AsyncRead + AsyncWrite + Unpin,
    P: Protocol,
{
    let span = info_span!("rpc_connection", protocol = P::NAME, peer = ?peer_addr);

    async move {
        loop {
            let next_frame = match limits.keep_alive_idle {
                Some(idle) => match tokio::time::timeout(idle, connection.read_frame()).await {
                    Ok(result) => result,
                    Err(_elapsed) => {
                        debug!("idle timeout elapsed, closing connection");
                        return;
                    }
                },
                None => connection.read_frame().await,
            };

            let (meta, payload) = match next_frame {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    debug!("connection closed cleanly");
                    return;
                }
                Err(error) => {
                    warn!(%error, "closing connection after a transport error");
                    return;
                }
            };

            let (reply_meta, reply_payload) =
                dispatch(&registry, &filters, &timeouts, meta, payload, peer_addr).await;

            if let Err(error) = connection.write_frame(&reply_meta, &reply_payload).await {
                warn!(%error, "failed to write reply, closing connection");
                return;
            }
        }
    }
    .instrument(span)
    .await;
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;
    use polyrpc_net::protocol::{RpcMeta, SBinProtocol};
    use polyrpc_net::Connection;
    use polyrpc_system::{stub_from_handler, ServiceRegistry};
    use polyrpc_tower::{CallTimeouts, FilterChain};
    use polyrpc_types::{CallStatus, DataType};

    use super::serve_connection;

    fn decode_text(bytes: &[u8], _tag: DataType) -> Result<String, CallStatus> {
        std::str::from_utf8(bytes).map(str::to_owned).map_err(|_| CallStatus::MetaError)
    }

    fn encode_text(value: &String, _tag: DataType) -> Result<Bytes, CallStatus> {
        Ok(Bytes::copy_from_slice(value.as_bytes()))
    }

    #[tokio::test]
    async fn serves_one_request_then_closes_on_clean_eof() {
        let registry = std::sync::Arc::new(ServiceRegistry::new());
        registry
            .register(
                "greeter",
                "hello",
                stub_from_handler(decode_text, encode_text, |name: String, _ctx| async move {
                    Ok(format!("hello {name}"))
                }),
            )
            .expect("registers");

        let (client_io, server_io) = tokio::io::duplex(64 * 1024);
        let mut client: Connection<_, SBinProtocol> = Connection::new(client_io, 1024 * 1024);
        let server: Connection<_, SBinProtocol> = Connection::new(server_io, 1024 * 1024);

        let server_task = tokio::spawn(serve_connection(
            server,
            None,
            registry,
            std::sync::Arc::new(FilterChain::new()),
            CallTimeouts::default(),
            polyrpc_net::ConnectionLimits::default(),
        ));

        client
            .write_frame(&RpcMeta::request(1, "greeter", "hello"), b"world")
            .await
            .expect("write succeeds");

        let (reply_meta, payload) = client.read_frame().await.expect("read succeeds").expect("frame present");
        assert_eq!(reply_meta.status, CallStatus::Ok);
        assert_eq!(&payload[..], b"hello world");

        drop(client);
        tokio::time::timeout(Duration::from_secs(1), server_task)
            .await
            .expect("server task exits promptly after client disconnects")
            .expect("server task does not panic");
    }

    #[tokio::test]
    async fn idle_timeout_closes_a_connection_with_no_traffic() {
        let registry = std::sync::Arc::new(ServiceRegistry::new());
        let (client_io, server_io) = tokio::io::duplex(64 * 1024);
        let server: Connection<_, SBinProtocol> = Connection::new(server_io, 1024 * 1024);

        let limits = polyrpc_net::ConnectionLimits {
            keep_alive_idle: Some(Duration::from_millis(20)),
            ..polyrpc_net::ConnectionLimits::default()
        };

        let server_task = tokio::spawn(serve_connection(
            server,
            None,
            registry,
            std::sync::Arc::new(FilterChain::new()),
            CallTimeouts::default(),
            limits,
        ));

        tokio::time::timeout(Duration::from_secs(1), server_task)
            .await
            .expect("server task exits once idle timeout elapses")
            .expect("server task does not panic");
        drop(client_io);
    }
}
