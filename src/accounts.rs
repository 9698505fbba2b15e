/// Account registration and credential checks over a `UserStore`.

use std::sync::Arc;

use mongodb::bson::DateTime;
use uuid::Uuid;

use crate::auth::{hash_password, validate_password_strength, verify_password, Identity};
use crate::error::{AppError, AuthError, DatabaseError};
use crate::store::{CallPolicy, User, UserStore};
use crate::validators::{is_valid_email, is_valid_name};

/// Signup input, before validation
pub struct NewAccount<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Clone)]
pub struct Accounts {
    store: Arc<dyn UserStore>,
    policy: CallPolicy,
}

impl Accounts {
    pub fn new(store: Arc<dyn UserStore>, policy: CallPolicy) -> Self {
        Self { store, policy }
    }

    /// Validate input, hash the password and store a new user
    ///
    /// # Errors
    /// - Validation errors for bad names, email or weak passwords
    /// - `UniqueConstraintViolation` if the email is already registered
    pub async fn register(&self, account: NewAccount<'_>) -> Result<User, AppError> {
        let first_name = is_valid_name("first_name", account.first_name)?;
        let last_name = is_valid_name("last_name", account.last_name)?;
        let email = is_valid_email(account.email)?;
        validate_password_strength(account.password)?;

        let password_hash = hash_password(account.password.to_string()).await?;
        let now = DateTime::now();
        let user = User {
            user_id: Uuid::new_v4().to_string(),
            first_name,
            last_name,
            email,
            password_hash,
            created_at: now,
            updated_at: now,
        };

        let store = &self.store;
        let new_user = &user;
        match self
            .policy
            .run("insert_user", move || store.insert(new_user))
            .await
        {
            Ok(()) => {}
            Err(DatabaseError::UniqueConstraintViolation(_)) => {
                if !self.was_inserted(&user).await? {
                    return Err(DatabaseError::UniqueConstraintViolation(
                        "Email already registered".to_string(),
                    )
                    .into());
                }
                tracing::warn!(user_id = %user.user_id, "Insert acknowledged late, account already stored");
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user_id = %user.user_id, "Account created");
        Ok(user)
    }

    /// A retried insert whose first attempt landed reports a duplicate on
    /// its own freshly generated `user_id`.
    async fn was_inserted(&self, user: &User) -> Result<bool, AppError> {
        let store = &self.store;
        let user_id = user.user_id.as_str();
        let stored = self
            .policy
            .run("find_user_by_id", move || store.find_by_id(user_id))
            .await?;

        Ok(stored.map_or(false, |stored| stored.email == user.email))
    }

    /// Check email and password
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AppError> {
        let email = is_valid_email(email).map_err(|_| AuthError::InvalidCredentials)?;

        let store = &self.store;
        let lookup = email.as_str();
        let user = self
            .policy
            .run("find_user_by_email", move || store.find_by_email(lookup))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password.to_string(), user.password_hash.clone()).await? {
            tracing::warn!(user_id = %user.user_id, "Password mismatch");
            return Err(AuthError::InvalidCredentials.into());
        }

        Ok(user)
    }

    pub async fn find(&self, user_id: &str) -> Result<User, AppError> {
        let store = &self.store;
        self.policy
            .run("find_user_by_id", move || store.find_by_id(user_id))
            .await?
            .ok_or_else(|| {
                AppError::Database(DatabaseError::NotFound(format!("User {}", user_id)))
            })
    }
}

impl User {
    pub fn identity(&self) -> Identity {
        Identity {
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            user_id: self.user_id.clone(),
        }
    }
}
