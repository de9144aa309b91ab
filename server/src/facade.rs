//! [`RpcServer`]: the server-side facade.
//!
//! Parameterized by a [`Protocol`] the same way `polyrpc-client`'s facade is
//! parameterized by a protocol adapter: one `RpcServer<P>` hosts every
//! registered service over exactly one wire protocol.

use std::marker::PhantomData;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};

use error_stack::Report;
use polyrpc_net::{ConnectionLimits, Listener, Protocol};
use polyrpc_system::{RegistryError, Service, ServiceRegistry};
use polyrpc_tower::{CallTimeouts, CancelToken, Filter, FilterChain};
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::connection::serve_connection;
use crate::error::ServerError;

/// Hosts a [`ServiceRegistry`] behind one accept loop.
///
/// Construct, register services and filters, then call [`Self::start`] or
/// [`Self::serve`]. Both run until [`Self::stop`] is called from another
/// task (typically in response to a shutdown signal) or the listener itself
/// fails.
pub struct RpcServer<P: Protocol> {
    registry: Arc<ServiceRegistry>,
    filters: Arc<RwLock<FilterChain>>,
    config: ServerConfig,
    timeouts: CallTimeouts,
    shutdown: CancelToken,
    tasks: TaskTracker,
    _protocol: PhantomData<P>,
}

impl<P: Protocol> RpcServer<P> {
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            registry: Arc::new(ServiceRegistry::new()),
            filters: Arc::new(RwLock::new(FilterChain::new())),
            config,
            timeouts: CallTimeouts::default(),
            shutdown: CancelToken::new(),
            tasks: TaskTracker::new(),
            _protocol: PhantomData,
        }
    }

    /// Registers every method declared by `service`.
    ///
    /// # Errors
    ///
    /// Returns an error if any `(service, method)` pair collides with one
    /// already registered.
    pub fn add_service(&self, service: &dyn Service) -> Result<(), Report<RegistryError>> {
        self.registry.register_service(service)
    }

    /// Appends a filter to the chain run around every dispatched call.
    pub fn add_filter(&self, filter: Arc<dyn Filter>) {
        self.filters.write().expect("filter chain lock poisoned").push(filter);
    }

    /// Binds `0.0.0.0:port` and serves until [`Self::stop`] is called.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the listener fails, or if the listener
    /// errors while accepting.
    pub async fn start(&self, port: u16) -> Result<(), ServerError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = self.bind(addr).await?;
        self.serve(listener).await
    }

    /// Binds `addr` with this server's [`ConnectionLimits`], without
    /// accepting any connections yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the bind itself fails.
    pub async fn bind(&self, addr: SocketAddr) -> Result<Listener<P>, ServerError> {
        Listener::bind(addr, self.config.connection_limits)
            .await
            .map_err(ServerError::from)
    }

    /// Serves an already-bound listener until [`Self::stop`] is called.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener itself errors while accepting.
    pub async fn serve(&self, listener: Listener<P>) -> Result<(), ServerError> {
        info!(protocol = P::NAME, "listening");

        loop {
            let accepted = tokio::select! {
                () = self.shutdown.cancelled() => {
                    info!("shutdown requested, stopping accept loop");
                    break;
                }
                accepted = listener.accept() => accepted?,
            };

            let registry = Arc::clone(&self.registry);
            let filters = Arc::new(self.filters.read().expect("filter chain lock poisoned").clone());
            let timeouts = self.timeouts;
            let limits = self.connection_limits();
            let peer_addr = accepted.peer_addr;

            self.tasks.spawn(async move {
                let _permit = accepted.permit;
                serve_connection(accepted.connection, Some(peer_addr), registry, filters, timeouts, limits).await;
            });
        }

        Ok(())
    }

    /// Stops accepting new connections and waits (up to
    /// [`ServerConfig::stop_drain_deadline`]) for in-flight connections to
    /// finish serving their current request.
    pub async fn stop(&self) {
        self.shutdown.cancel();
        self.tasks.close();
        if tokio::time::timeout(self.config.stop_drain_deadline, self.tasks.wait())
            .await
            .is_err()
        {
            warn!("drain deadline elapsed with connections still in flight");
        }
    }

    fn connection_limits(&self) -> ConnectionLimits {
        self.config.connection_limits
    }
}
