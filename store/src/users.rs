use crate::error::Error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// The role carried by a user record and by every issued token.
///
/// A closed enum rather than a free-form string: permission checks match on it
/// exhaustively. Tokens minted by older issuers may carry capitalized role
/// names, accepted here as aliases. Anything else decodes to `Unknown`, which
/// no permission check accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "Admin")]
    Admin,
    #[serde(alias = "Worker")]
    Worker,
    #[serde(alias = "User")]
    User,
    #[serde(other)]
    Unknown,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Worker => "worker",
            Role::User => "user",
            Role::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored user record. The password field holds the salted digest in
/// `salt:hash` form and is never serialized back out.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub user_id: String,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub password: String,
    pub role: Role,
    pub department: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Conditional insert keyed on user identity. Fails with `RecordConflict`
    /// when the email or username is already registered.
    async fn insert_new(&self, user: Model) -> Result<Model, Error>;

    /// Look a user up by a normalized identifier, matching the stored email
    /// first and the username second.
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Model>, Error>;
}
