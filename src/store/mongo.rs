use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, UpdateOptions};
use mongodb::{Collection, Database, IndexModel};

use super::{TokenStore, User, UserStore, UserTokenRecord};
use crate::error::DatabaseError;

const TOKEN_COLLECTION: &str = "user_tokens";
const USER_COLLECTION: &str = "users";
const DUPLICATE_KEY: i32 = 11000;

impl From<mongodb::error::Error> for DatabaseError {
    fn from(err: mongodb::error::Error) -> Self {
        match err.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(write_error))
                if write_error.code == DUPLICATE_KEY =>
            {
                DatabaseError::UniqueConstraintViolation(write_error.message.clone())
            }
            ErrorKind::Io(_)
            | ErrorKind::ServerSelection { .. }
            | ErrorKind::ConnectionPoolCleared { .. } => DatabaseError::Unavailable(err.to_string()),
            _ => DatabaseError::UnexpectedError(err.to_string()),
        }
    }
}

fn unique_index(field: &str) -> IndexModel {
    let mut keys = Document::new();
    keys.insert(field, 1);

    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

pub struct MongoTokenStore {
    collection: Collection<UserTokenRecord>,
}

impl MongoTokenStore {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(TOKEN_COLLECTION),
        }
    }

    /// One record per user, plus an index for the reverse token lookup
    pub async fn ensure_indexes(&self) -> Result<(), DatabaseError> {
        self.collection
            .create_index(unique_index("user_id"), None)
            .await?;
        self.collection
            .create_index(IndexModel::builder().keys(doc! { "token": 1 }).build(), None)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TokenStore for MongoTokenStore {
    async fn upsert(&self, record: &UserTokenRecord) -> Result<(), DatabaseError> {
        let options = UpdateOptions::builder().upsert(true).build();

        self.collection
            .update_one(
                doc! { "user_id": record.user_id.as_str() },
                doc! {
                    "$set": {
                        "token": record.token.as_str(),
                        "refresh_token": record.refresh_token.as_str(),
                        "updated_at": record.updated_at,
                    }
                },
                options,
            )
            .await?;

        Ok(())
    }

    async fn delete(&self, user_id: &str) -> Result<(), DatabaseError> {
        let result = self
            .collection
            .delete_one(doc! { "user_id": user_id }, None)
            .await?;

        if result.deleted_count == 0 {
            tracing::debug!(user_id = %user_id, "No token record to delete");
        }
        Ok(())
    }

    async fn find_by_user_id(
        &self,
        user_id: &str,
    ) -> Result<Option<UserTokenRecord>, DatabaseError> {
        Ok(self
            .collection
            .find_one(doc! { "user_id": user_id }, None)
            .await?)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<UserTokenRecord>, DatabaseError> {
        Ok(self.collection.find_one(doc! { "token": token }, None).await?)
    }
}

pub struct MongoUserStore {
    collection: Collection<User>,
}

impl MongoUserStore {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(USER_COLLECTION),
        }
    }

    pub async fn ensure_indexes(&self) -> Result<(), DatabaseError> {
        self.collection
            .create_index(unique_index("user_id"), None)
            .await?;
        self.collection
            .create_index(unique_index("email"), None)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn insert(&self, user: &User) -> Result<(), DatabaseError> {
        self.collection.insert_one(user, None).await?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self.collection.find_one(doc! { "email": email }, None).await?)
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self
            .collection
            .find_one(doc! { "user_id": user_id }, None)
            .await?)
    }
}
