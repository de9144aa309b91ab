//! [`ConnectionPool`]: client-side connection reuse against one remote
//! address, protected by short critical sections around borrow/return.
//!
//! A pool owns up to `max_connections` live TCP connections framed by one
//! [`Protocol`]. `checkout` hands out an idle connection or opens a fresh one
//! under a semaphore permit that bounds concurrency; `checkin` returns a
//! still-usable connection to the idle queue, or simply drops the permit if
//! the connection failed and should not be reused.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

use crate::config::ConnectionLimits;
use crate::connection::Connection;
use crate::error::TransportError;
use crate::protocol::Protocol;

/// A checked-out connection plus the permit that reserves its slot in the
/// pool. Dropping this without calling [`ConnectionPool::checkin`] releases
/// the permit (freeing a slot) without returning the connection to the idle
/// queue — the right behavior after a connection has failed.
pub struct Checkout<S, P: Protocol> {
    pub connection: Connection<S, P>,
    permit: OwnedSemaphorePermit,
}

pub struct ConnectionPool<P: Protocol> {
    addr: SocketAddr,
    connect_timeout: Duration,
    ceiling: usize,
    idle: Mutex<VecDeque<Connection<TcpStream, P>>>,
    semaphore: Arc<Semaphore>,
}

impl<P: Protocol> ConnectionPool<P> {
    #[must_use]
    pub fn new(addr: SocketAddr, limits: ConnectionLimits, connect_timeout: Duration) -> Self {
        Self {
            addr,
            connect_timeout,
            ceiling: limits.frame_ceiling,
            idle: Mutex::new(VecDeque::new()),
            semaphore: Arc::new(Semaphore::new(limits.max_connections)),
        }
    }

    /// Reserves a connection slot, reusing an idle connection if one is
    /// available or dialing a fresh one otherwise. Blocks (without holding
    /// the idle-queue lock) until a slot is free when the pool is saturated.
    pub async fn checkout(&self) -> Result<Checkout<TcpStream, P>, TransportError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .expect("semaphore is never closed");

        let existing = self.idle.lock().await.pop_front();
        let connection = match existing {
            Some(connection) => connection,
            None => {
                let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(self.addr))
                    .await
                    .map_err(|_| TransportError::Timeout("connect"))?
                    .map_err(TransportError::Connect)?;
                Connection::new(stream, self.ceiling)
            }
        };

        Ok(Checkout { connection, permit })
    }

    /// Returns a still-healthy connection to the idle queue. The permit is
    /// dropped along with `checkout`'s return value either way, freeing the
    /// slot for the next caller.
    pub async fn checkin(&self, checkout: Checkout<TcpStream, P>) {
        self.idle.lock().await.push_back(checkout.connection);
        drop(checkout.permit);
    }

    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::net::TcpListener;

    use super::ConnectionPool;
    use crate::config::ConnectionLimits;
    use crate::protocol::SBinProtocol;

    #[tokio::test]
    async fn checkout_dials_a_fresh_connection_when_the_idle_queue_is_empty() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let _ = listener.accept().await;
        });

        let pool: ConnectionPool<SBinProtocol> =
            ConnectionPool::new(addr, ConnectionLimits::default(), Duration::from_secs(1));
        let checkout = pool.checkout().await.expect("connects");
        pool.checkin(checkout).await;
    }

    #[tokio::test]
    async fn a_checked_in_connection_is_reused_on_the_next_checkout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            loop {
                if listener.accept().await.is_err() {
                    break;
                }
            }
        });

        let pool: ConnectionPool<SBinProtocol> =
            ConnectionPool::new(addr, ConnectionLimits::default(), Duration::from_secs(1));
        let first = pool.checkout().await.expect("connects");
        pool.checkin(first).await;

        assert_eq!(pool.idle.lock().await.len(), 1);
        let _second = pool.checkout().await.expect("reuses idle connection");
        assert_eq!(pool.idle.lock().await.len(), 0);
    }
}
