//! [`Listener`]: server-side accept loop with connection-count backpressure.
//! `max_connections` is enforced by pausing accept once the count is reached.

use std::marker::PhantomData;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::ConnectionLimits;
use crate::connection::Connection;
use crate::error::TransportError;
use crate::protocol::Protocol;

/// An accepted connection plus the permit reserving its slot against
/// `max_connections`. The caller holds the permit for the connection's
/// entire lifetime; dropping it (when the connection closes) lets
/// [`Listener::accept`] admit a new one.
pub struct Accepted<P: Protocol> {
    pub connection: Connection<TcpStream, P>,
    pub peer_addr: SocketAddr,
    pub permit: OwnedSemaphorePermit,
}

pub struct Listener<P: Protocol> {
    listener: TcpListener,
    ceiling: usize,
    semaphore: Arc<Semaphore>,
    _protocol: PhantomData<P>,
}

impl<P: Protocol> Listener<P> {
    pub async fn bind(addr: SocketAddr, limits: ConnectionLimits) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await.map_err(TransportError::Connect)?;
        Ok(Self {
            listener,
            ceiling: limits.frame_ceiling,
            semaphore: Arc::new(Semaphore::new(limits.max_connections)),
            _protocol: PhantomData,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.listener.local_addr().map_err(TransportError::Connect)
    }

    /// Blocks until a connection slot is free, then accepts the next
    /// incoming TCP connection. The returned permit must be held for as long
    /// as the connection is served.
    pub async fn accept(&self) -> Result<Accepted<P>, TransportError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .expect("semaphore is never closed");

        let (stream, peer_addr) = self.listener.accept().await.map_err(TransportError::Read)?;

        Ok(Accepted {
            connection: Connection::new(stream, self.ceiling),
            peer_addr,
            permit,
        })
    }

    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpStream;

    use super::Listener;
    use crate::config::ConnectionLimits;
    use crate::protocol::SBinProtocol;

    #[tokio::test]
    async fn accepts_a_connection_and_reports_the_peer_address() {
        let limits = ConnectionLimits {
            max_connections: 2,
            ..ConnectionLimits::default()
        };
        let listener: Listener<SBinProtocol> = Listener::bind("127.0.0.1:0".parse().unwrap(), limits)
            .await
            .expect("binds");
        let addr = listener.local_addr().expect("addr");

        let client = tokio::spawn(async move { TcpStream::connect(addr).await.expect("connects") });

        let accepted = listener.accept().await.expect("accepts");
        assert_eq!(accepted.peer_addr.ip(), addr.ip());
        let _client = client.await.expect("client task");
    }

    #[tokio::test]
    async fn backpressure_blocks_accept_once_the_limit_is_reached() {
        let limits = ConnectionLimits {
            max_connections: 1,
            ..ConnectionLimits::default()
        };
        let listener: Listener<SBinProtocol> = Listener::bind("127.0.0.1:0".parse().unwrap(), limits)
            .await
            .expect("binds");

        assert_eq!(listener.available_permits(), 1);
        let permit = std::sync::Arc::clone(&listener.semaphore).acquire_owned().await.expect("acquire");
        assert_eq!(listener.available_permits(), 0);
        drop(permit);
        assert_eq!(listener.available_permits(), 1);
    }
}
