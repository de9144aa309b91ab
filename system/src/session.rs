//! [`Session`]: per-connection state that outlives any single call. A
//! server carries this per-connection state, keyed by an
//! application-defined actor type, across calls on one connection. Distinct
//! from [`CallContext`](crate::context::CallContext), which is scoped to
//! one call.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

/// A connection's identity plus an optional application-defined "actor" slot
/// (authenticated user, negotiated codec preferences, whatever the service
/// needs to remember between calls on the same keep-alive connection).
pub struct Session<A> {
    id: Uuid,
    remote_addr: Option<SocketAddr>,
    actor: Arc<RwLock<Option<A>>>,
}

impl<A> Session<A> {
    #[must_use]
    pub fn new(id: Uuid, remote_addr: Option<SocketAddr>) -> Self {
        Self {
            id,
            remote_addr,
            actor: Arc::new(RwLock::new(None)),
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    pub async fn actor(&self) -> tokio::sync::RwLockReadGuard<'_, Option<A>> {
        self.actor.read().await
    }

    pub async fn set_actor(&self, actor: A) {
        *self.actor.write().await = Some(actor);
    }

    pub async fn clear_actor(&self) {
        *self.actor.write().await = None;
    }
}

impl<A> Clone for Session<A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            remote_addr: self.remote_addr,
            actor: Arc::clone(&self.actor),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use uuid::Uuid;

    use super::Session;

    #[tokio::test]
    async fn actor_is_absent_until_set() {
        let session: Session<String> = Session::new(Uuid::new_v4(), None::<SocketAddr>);
        assert!(session.actor().await.is_none());

        session.set_actor("alice".to_owned()).await;
        assert_eq!(session.actor().await.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn clones_share_the_same_actor_slot() {
        let session: Session<u32> = Session::new(Uuid::new_v4(), None);
        let clone = session.clone();

        session.set_actor(42).await;
        assert_eq!(*clone.actor().await, Some(42));
    }
}
