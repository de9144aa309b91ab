//! [`RpcClient`]: the client-side facade.
//!
//! Parameterized by a [`Protocol`] the same way `polyrpc-server`'s
//! `RpcServer` is: one `RpcClient<P>` issues every call against one
//! remote address over exactly one wire protocol.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use bytes::Bytes;
use polyrpc_net::{ConnectionPool, Protocol};
use polyrpc_tower::{CallTimeouts, Filter, FilterChain};
use polyrpc_types::{CallStatus, DataType};

use crate::config::ClientConfig;
use crate::task::{ClientCallResult, ClientTask};

/// Builds and runs calls against one remote address.
///
/// Construction never dials; [`ConnectionPool`] dials lazily on the first
/// checkout, so an `RpcClient` that never issues a call opens no sockets.
pub struct RpcClient<P: Protocol> {
    pool: Arc<ConnectionPool<P>>,
    filters: Arc<RwLock<FilterChain>>,
    config: ClientConfig,
    timeouts: CallTimeouts,
    next_correlation_id: Arc<AtomicU64>,
}

impl<P: Protocol> RpcClient<P> {
    #[must_use]
    pub fn connect(addr: SocketAddr, config: ClientConfig) -> Self {
        let pool = Arc::new(ConnectionPool::new(addr, config.connection_limits, config.connect_timeout));
        let timeouts = CallTimeouts {
            send: config.connect_timeout,
            keep_alive_idle: config.keep_alive_timeout,
            overall: config.response_timeout,
        };
        Self {
            pool,
            filters: Arc::new(RwLock::new(FilterChain::new())),
            config,
            timeouts,
            next_correlation_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Appends a filter run around every call issued by this client.
    pub fn add_filter(&self, filter: Arc<dyn Filter>) {
        self.filters.write().expect("filter chain lock poisoned").push(filter);
    }

    #[must_use]
    pub fn remote_addr(&self) -> SocketAddr {
        self.pool.addr()
    }

    /// Builds a [`ClientTask`] bound to `request`, ready to [`ClientTask::start`].
    ///
    /// Mirrors `create_<Method>_task` from a generated client: `encode`/
    /// `decode` are the payload codec pair a schema compiler would normally
    /// emit for this method.
    pub fn create_task<Req, Resp, Enc, Dec>(
        &self,
        service: impl Into<String>,
        method: impl Into<String>,
        encode: Enc,
        decode: Dec,
        request: Req,
    ) -> ClientTask<Req, Resp, Enc, Dec, P>
    where
        Enc: Fn(&Req, DataType) -> Result<Bytes, CallStatus> + Send + Sync,
        Dec: Fn(&[u8], DataType) -> Result<Resp, CallStatus> + Send + Sync,
    {
        ClientTask {
            pool: Arc::clone(&self.pool),
            filters: self.filters.read().expect("filter chain lock poisoned").clone(),
            timeouts: self.timeouts,
            retry_max: self.config.retry_max,
            correlation_id: self.next_correlation_id.fetch_add(1, Ordering::Relaxed),
            service: service.into(),
            method: method.into(),
            data_type: self.config.default_data_type,
            compress_type: self.config.default_compress_type,
            encode,
            decode,
            module_data: polyrpc_types::ModuleData::new(),
            request,
            _resp: std::marker::PhantomData,
        }
    }

    /// The async-future convenience: `async_<Method>(&req)` from §4.4,
    /// resolving to a `(response, sync-context)` pair once the call
    /// completes.
    pub async fn call<Req, Resp, Enc, Dec>(
        &self,
        service: impl Into<String>,
        method: impl Into<String>,
        encode: Enc,
        decode: Dec,
        request: Req,
    ) -> ClientCallResult<Resp>
    where
        Enc: Fn(&Req, DataType) -> Result<Bytes, CallStatus> + Send + Sync,
        Dec: Fn(&[u8], DataType) -> Result<Resp, CallStatus> + Send + Sync,
    {
        self.create_task(service, method, encode, decode, request).start().await
    }

    /// The synchronous convenience: `<Method>(&req, &resp, &ctx)` from §4.4.
    /// Blocks the calling thread until the call would have invoked its
    /// callback.
    ///
    /// # Panics
    ///
    /// Panics if called from a single-threaded Tokio runtime, or outside any
    /// Tokio runtime: `block_in_place` requires a multi-threaded executor to
    /// hand off its other work to while this thread blocks.
    pub fn call_blocking<Req, Resp, Enc, Dec>(
        &self,
        service: impl Into<String>,
        method: impl Into<String>,
        encode: Enc,
        decode: Dec,
        request: Req,
    ) -> ClientCallResult<Resp>
    where
        Enc: Fn(&Req, DataType) -> Result<Bytes, CallStatus> + Send + Sync,
        Dec: Fn(&[u8], DataType) -> Result<Resp, CallStatus> + Send + Sync,
    {
        let task = self.create_task(service, method, encode, decode, request);
        tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(task.start()))
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.config.connect_timeout
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use polyrpc_net::protocol::SBinProtocol;
    use polyrpc_server::RpcServer;
    use polyrpc_system::ServiceBuilder;
    use polyrpc_tower::filter::{BoxFuture, Filter};
    use polyrpc_types::{CallStatus, DataType, ModuleData};

    use super::RpcClient;
    use crate::config::ClientConfig;

    fn decode_text(bytes: &[u8], _tag: DataType) -> Result<String, CallStatus> {
        std::str::from_utf8(bytes).map(str::to_owned).map_err(|_| CallStatus::MetaError)
    }

    fn encode_text(value: &String, _tag: DataType) -> Result<bytes::Bytes, CallStatus> {
        Ok(bytes::Bytes::copy_from_slice(value.as_bytes()))
    }

    async fn spawn_greeter_server() -> std::net::SocketAddr {
        let server: Arc<RpcServer<SBinProtocol>> = Arc::new(RpcServer::new(polyrpc_server::ServerConfig::default()));
        let service = ServiceBuilder::new("greeter")
            .add_method("hello", decode_text, encode_text, |name: String, _ctx| async move {
                Ok(format!("hello {name}"))
            })
            .build();
        server.add_service(&service).expect("registers");

        let listener = server.bind("127.0.0.1:0".parse().unwrap()).await.expect("binds");
        let addr = listener.local_addr().expect("bound addr");
        tokio::spawn(async move {
            let _ = server.serve(listener).await;
        });
        addr
    }

    #[tokio::test]
    async fn async_call_round_trips_against_a_real_server() {
        let addr = spawn_greeter_server().await;
        let client: RpcClient<SBinProtocol> = RpcClient::connect(addr, ClientConfig::default());

        let result = client
            .call("greeter", "hello", encode_text, decode_text, "world".to_owned())
            .await;

        assert_eq!(result.outcome.status, CallStatus::Ok);
        assert_eq!(result.response.as_deref(), Some("hello world"));
    }

    #[tokio::test]
    async fn an_unregistered_method_reports_method_not_found() {
        let addr = spawn_greeter_server().await;
        let client: RpcClient<SBinProtocol> = RpcClient::connect(addr, ClientConfig::default());

        let result = client
            .call("greeter", "goodbye", encode_text, decode_text, "world".to_owned())
            .await;

        assert_eq!(result.outcome.status, CallStatus::MethodNotFound);
        assert!(result.response.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn call_blocking_blocks_the_calling_thread_until_the_reply_arrives() {
        // `block_in_place` hands this worker thread's other work off to a
        // sibling thread, which only exists on a multi-threaded runtime —
        // hence the explicit `flavor` above, and calling directly from this
        // async test body rather than from a `spawn_blocking` task (whose
        // threads are not runtime workers `block_in_place` can hand off to).
        let addr = spawn_greeter_server().await;
        let client: RpcClient<SBinProtocol> = RpcClient::connect(addr, ClientConfig::default());

        let result = client.call_blocking("greeter", "hello", encode_text, decode_text, "sync".to_owned());

        assert_eq!(result.outcome.status, CallStatus::Ok);
        assert_eq!(result.response.as_deref(), Some("hello sync"));
    }

    struct RequireAuthKey;
    impl Filter for RequireAuthKey {
        fn client_begin<'a>(&'a self, data: &'a mut ModuleData) -> BoxFuture<'a, bool> {
            Box::pin(async move { data.get("my_auth_key") == Some("my_auth_value") })
        }
    }

    #[tokio::test]
    async fn a_rejecting_client_begin_filter_never_reaches_the_transport() {
        let addr = spawn_greeter_server().await;
        let client: RpcClient<SBinProtocol> = RpcClient::connect(addr, ClientConfig::default());
        client.add_filter(Arc::new(RequireAuthKey));

        let mut task = client.create_task("greeter", "hello", encode_text, decode_text, "world".to_owned());
        task.insert_module_data("my_auth_key", "my_auth_value").expect("fits");
        let ok_result = task.start().await;
        assert_eq!(ok_result.outcome.status, CallStatus::Ok);

        let rejected_result = client
            .create_task("greeter", "hello", encode_text, decode_text, "world".to_owned())
            .start()
            .await;
        assert_eq!(rejected_result.outcome.status, CallStatus::MetaError);
        assert!(rejected_result.response.is_none());
    }
}
