use chrono::Utc;
use store::connections::Model as Connection;
use store::users::Role;
use store::ConnectionStoreRef;

/// Durable mapping of live subscriber identities to delivery endpoints.
///
/// The registry exclusively owns entries: subscribers are added on connect,
/// removed on explicit disconnect, and pruned lazily when a delivery reports
/// the peer gone. Entries also carry a passive TTL so the backing store can
/// expire the ones nothing ever prunes.
pub struct ConnectionRegistry {
    store: ConnectionStoreRef,
    ttl_seconds: i64,
}

impl ConnectionRegistry {
    pub fn new(store: ConnectionStoreRef, ttl_seconds: i64) -> Self {
        Self { store, ttl_seconds }
    }

    /// Idempotent upsert of a subscriber entry.
    pub async fn put(
        &self,
        connection_id: &str,
        user_id: &str,
        role: Role,
        department: &str,
    ) -> Result<(), store::Error> {
        self.store
            .put(Connection {
                connection_id: connection_id.to_string(),
                user_id: user_id.to_string(),
                role,
                department: department.to_string(),
                ttl: Utc::now().timestamp() + self.ttl_seconds,
            })
            .await
    }

    /// Idempotent delete; unknown connections are not an error.
    pub async fn remove(&self, connection_id: &str) -> Result<(), store::Error> {
        self.store.remove(connection_id).await
    }

    /// Full snapshot with no ordering or recency guarantee. Entries may be
    /// stale by the time of read; delivery failure is what proves it.
    pub async fn list_all(&self) -> Result<Vec<Connection>, store::Error> {
        self.store.scan().await
    }
}
