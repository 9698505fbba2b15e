/// Token lifecycle: issue, validate, persist and look up JWT session tokens.
///
/// Every store call goes through the configured `CallPolicy`.

use std::sync::Arc;

use mongodb::bson::DateTime;

use crate::auth::claims::{Identity, TokenClaims};
use crate::auth::jwt::{sign_claims, verify_token};
use crate::configuration::{JwtSettings, StoreSettings};
use crate::error::{AppError, ConfigError, DatabaseError};
use crate::store::{CallPolicy, TokenStore, UserTokenRecord};

/// A freshly signed access/refresh token pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenService {
    jwt: JwtSettings,
    store: Arc<dyn TokenStore>,
    policy: CallPolicy,
}

impl TokenService {
    /// # Errors
    /// Returns `MissingRequired` if the signing secret is empty
    pub fn new(
        jwt: JwtSettings,
        store_settings: &StoreSettings,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self, ConfigError> {
        if jwt.secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt.secret".to_string()));
        }

        Ok(Self {
            jwt,
            store,
            policy: CallPolicy::from_settings(store_settings),
        })
    }

    /// Access token lifetime in seconds
    pub fn access_token_expiry(&self) -> i64 {
        self.jwt.access_token_expiry
    }

    /// Sign an access token carrying the identity and a refresh token carrying only an expiry
    pub fn issue_token_pair(&self, identity: &Identity) -> Result<TokenPair, AppError> {
        let access = TokenClaims::access(identity, self.jwt.access_token_expiry);
        let refresh = TokenClaims::refresh(self.jwt.refresh_token_expiry);

        Ok(TokenPair {
            access_token: sign_claims(&access, &self.jwt.secret)?,
            refresh_token: sign_claims(&refresh, &self.jwt.secret)?,
        })
    }

    /// Verify signature and expiry
    ///
    /// # Errors
    /// `SignatureInvalid`, `MalformedClaims` or `TokenExpired`
    pub fn validate_token(&self, token: &str) -> Result<TokenClaims, AppError> {
        Ok(verify_token(token, &self.jwt.secret)?)
    }

    /// Upsert the user's token record, replacing any previous pair
    pub async fn persist_token_pair(
        &self,
        access_token: &str,
        refresh_token: &str,
        user_id: &str,
    ) -> Result<(), AppError> {
        let record = UserTokenRecord {
            user_id: user_id.to_string(),
            token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            updated_at: DateTime::now(),
        };

        let store = &self.store;
        let record = &record;
        self.policy
            .run("persist_token_pair", move || store.upsert(record))
            .await?;

        tracing::debug!(user_id = %user_id, "Token pair persisted");
        Ok(())
    }

    /// Idempotent: deleting an absent record succeeds
    pub async fn delete_token_record(&self, user_id: &str) -> Result<(), AppError> {
        let store = &self.store;
        self.policy
            .run("delete_token_record", move || store.delete(user_id))
            .await?;
        Ok(())
    }

    pub async fn get_access_token(&self, user_id: &str) -> Result<String, AppError> {
        Ok(self.find_record(user_id).await?.token)
    }

    pub async fn get_refresh_token(&self, user_id: &str) -> Result<String, AppError> {
        Ok(self.find_record(user_id).await?.refresh_token)
    }

    /// Reverse lookup from a current access token to its owner
    pub async fn get_user_id_by_token(&self, access_token: &str) -> Result<String, AppError> {
        let store = &self.store;
        self.policy
            .run("get_user_id_by_token", move || store.find_by_token(access_token))
            .await?
            .map(|record| record.user_id)
            .ok_or_else(|| {
                AppError::Database(DatabaseError::NotFound("Token not on record".to_string()))
            })
    }

    async fn find_record(&self, user_id: &str) -> Result<UserTokenRecord, AppError> {
        let store = &self.store;
        self.policy
            .run("find_token_record", move || store.find_by_user_id(user_id))
            .await?
            .ok_or_else(|| {
                AppError::Database(DatabaseError::NotFound(format!(
                    "No token record for user {}",
                    user_id
                )))
            })
    }
}
