use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{TokenStore, User, UserStore, UserTokenRecord};
use crate::error::DatabaseError;

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>, DatabaseError> {
    mutex
        .lock()
        .map_err(|_| DatabaseError::UnexpectedError(format!("{} lock poisoned", name)))
}

/// Token records keyed by user id
#[derive(Default)]
pub struct InMemoryTokenStore {
    records: Mutex<HashMap<String, UserTokenRecord>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn upsert(&self, record: &UserTokenRecord) -> Result<(), DatabaseError> {
        lock(&self.records, "token store")?.insert(record.user_id.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, user_id: &str) -> Result<(), DatabaseError> {
        lock(&self.records, "token store")?.remove(user_id);
        Ok(())
    }

    async fn find_by_user_id(
        &self,
        user_id: &str,
    ) -> Result<Option<UserTokenRecord>, DatabaseError> {
        Ok(lock(&self.records, "token store")?.get(user_id).cloned())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<UserTokenRecord>, DatabaseError> {
        Ok(lock(&self.records, "token store")?
            .values()
            .find(|record| record.token == token)
            .cloned())
    }
}

/// Users keyed by user id
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<String, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: &User) -> Result<(), DatabaseError> {
        let mut users = lock(&self.users, "user store")?;

        if users.contains_key(&user.user_id) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "User id already exists".to_string(),
            ));
        }
        if users.values().any(|existing| existing.email == user.email) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "Email already registered".to_string(),
            ));
        }

        users.insert(user.user_id.clone(), user.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        Ok(lock(&self.users, "user store")?
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, DatabaseError> {
        Ok(lock(&self.users, "user store")?.get(user_id).cloned())
    }
}
