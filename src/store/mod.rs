/// Document store layer
///
/// Persistence is behind two traits so the store handle can be built at
/// startup and injected: MongoDB in production, in-memory for local runs
/// and tests.

mod memory;
mod mongo;
mod policy;

use async_trait::async_trait;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::error::DatabaseError;

pub use memory::{InMemoryTokenStore, InMemoryUserStore};
pub use mongo::{MongoTokenStore, MongoUserStore};
pub use policy::CallPolicy;

/// Per-user token record, stored in the `user_tokens` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserTokenRecord {
    pub user_id: String,
    pub token: String,
    pub refresh_token: String,
    pub updated_at: DateTime,
}

/// Account record, stored in the `users` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Insert or overwrite the record keyed by `record.user_id`
    async fn upsert(&self, record: &UserTokenRecord) -> Result<(), DatabaseError>;

    /// Remove the record for `user_id`; absent records are not an error
    async fn delete(&self, user_id: &str) -> Result<(), DatabaseError>;

    async fn find_by_user_id(&self, user_id: &str)
        -> Result<Option<UserTokenRecord>, DatabaseError>;

    /// Reverse lookup by current access token
    async fn find_by_token(&self, token: &str) -> Result<Option<UserTokenRecord>, DatabaseError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `UniqueConstraintViolation` when the email or id is taken
    async fn insert(&self, user: &User) -> Result<(), DatabaseError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, DatabaseError>;
}
