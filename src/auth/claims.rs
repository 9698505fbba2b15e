/// JWT Claims structure
///
/// Access tokens carry the full identity; refresh tokens carry only `exp`
/// and `jti`, so every identity field defaults to empty on decode.
/// `jti` is random per token: no two issued tokens are equal strings.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The identity a token pair is issued for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub user_id: String,
}

/// Signed token payload
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub first_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_name: String,
    /// Owning user id
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,
    /// Unique token id
    #[serde(default)]
    pub jti: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl TokenClaims {
    /// Claims for an access token expiring `expiry_seconds` from now
    pub fn access(identity: &Identity, expiry_seconds: i64) -> Self {
        Self {
            email: identity.email.clone(),
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            uid: identity.user_id.clone(),
            jti: Uuid::new_v4().to_string(),
            exp: chrono::Utc::now().timestamp() + expiry_seconds,
        }
    }

    /// Claims for a refresh token: no identity, only a token id and expiry
    pub fn refresh(expiry_seconds: i64) -> Self {
        Self {
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            uid: String::new(),
            jti: Uuid::new_v4().to_string(),
            exp: chrono::Utc::now().timestamp() + expiry_seconds,
        }
    }

    pub fn identity(&self) -> Identity {
        Identity {
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            user_id: self.uid.clone(),
        }
    }
}
