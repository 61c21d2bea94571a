use crate::error::Error;
use crate::users::Role;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One live subscriber channel. `department` holds the sentinel `"none"` when
/// the subscriber has no department scope; `ttl` is a unix-seconds expiry
/// stamp used by the backing store for passive cleanup.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub connection_id: String,
    pub user_id: String,
    pub role: Role,
    pub department: String,
    pub ttl: i64,
}

#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Idempotent upsert keyed on `connection_id`.
    async fn put(&self, connection: Model) -> Result<(), Error>;

    /// Idempotent delete; removing an unknown connection is not an error.
    async fn remove(&self, connection_id: &str) -> Result<(), Error>;

    /// Full snapshot; callers must tolerate entries that are already stale.
    async fn scan(&self) -> Result<Vec<Model>, Error>;
}
