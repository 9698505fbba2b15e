/// User Routes
///
/// Signup, login, refresh, current user and logout.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::accounts::{Accounts, NewAccount};
use crate::auth::{TokenClaims, TokenPair, TokenService};
use crate::error::{AppError, AuthError, DatabaseError};

#[derive(Deserialize)]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub user_id: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct SignupResponse {
    pub user_id: String,
}

/// Token pair handed to the client
#[derive(Serialize)]
pub struct AuthResponse {
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl AuthResponse {
    fn bearer(user_id: String, pair: TokenPair, expires_in: i64) -> Self {
        Self {
            user_id,
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

#[derive(Serialize)]
pub struct UserResponse {
    pub user_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: String,
}

/// POST /users/signup
///
/// # Errors
/// - 400: invalid name, email or weak password
/// - 409: email already registered
pub async fn signup(
    form: web::Json<SignupRequest>,
    accounts: web::Data<Accounts>,
) -> Result<HttpResponse, AppError> {
    let user = accounts
        .register(NewAccount {
            first_name: &form.first_name,
            last_name: &form.last_name,
            email: &form.email,
            password: &form.password,
        })
        .await?;

    Ok(HttpResponse::Created().json(SignupResponse {
        user_id: user.user_id,
    }))
}

/// POST /users/login
///
/// Verifies credentials, issues a fresh token pair and stores it as the
/// user's current session, replacing any previous one.
///
/// # Errors
/// - 401: unknown email or wrong password (same response for both)
pub async fn login(
    form: web::Json<LoginRequest>,
    accounts: web::Data<Accounts>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse, AppError> {
    let user = accounts.authenticate(&form.email, &form.password).await?;

    let pair = tokens.issue_token_pair(&user.identity())?;
    tokens
        .persist_token_pair(&pair.access_token, &pair.refresh_token, &user.user_id)
        .await?;

    tracing::info!(user_id = %user.user_id, "User logged in");

    Ok(HttpResponse::Ok().json(AuthResponse::bearer(
        user.user_id,
        pair,
        tokens.access_token_expiry(),
    )))
}

/// POST /users/refresh
///
/// Exchanges the current refresh token for a new pair. A refresh token
/// that is valid but no longer on record (rotated or logged out) is rejected.
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    accounts: web::Data<Accounts>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse, AppError> {
    tokens.validate_token(&form.refresh_token)?;

    let stored = match tokens.get_refresh_token(&form.user_id).await {
        Ok(stored) => stored,
        Err(AppError::Database(DatabaseError::NotFound(_))) => {
            return Err(AuthError::SessionEnded.into())
        }
        Err(e) => return Err(e),
    };
    if stored != form.refresh_token {
        tracing::warn!(user_id = %form.user_id, "Stale refresh token presented");
        return Err(AuthError::SessionEnded.into());
    }

    let user = accounts.find(&form.user_id).await?;
    let pair = tokens.issue_token_pair(&user.identity())?;
    tokens
        .persist_token_pair(&pair.access_token, &pair.refresh_token, &user.user_id)
        .await?;

    tracing::info!(user_id = %user.user_id, "Token pair refreshed");

    Ok(HttpResponse::Ok().json(AuthResponse::bearer(
        user.user_id,
        pair,
        tokens.access_token_expiry(),
    )))
}

/// GET /users/me
///
/// **Requires a live bearer token**; claims are injected by `JwtMiddleware`.
pub async fn get_current_user(
    claims: web::ReqData<TokenClaims>,
    accounts: web::Data<Accounts>,
) -> Result<HttpResponse, AppError> {
    let user = accounts.find(&claims.uid).await?;
    let created_at = user
        .created_at
        .try_to_rfc3339_string()
        .map_err(|e| AppError::Internal(format!("Unrepresentable timestamp: {}", e)))?;

    Ok(HttpResponse::Ok().json(UserResponse {
        user_id: user.user_id,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        created_at,
    }))
}

/// POST /users/logout
///
/// Deletes the user's token record; the access token stops working at once.
pub async fn logout(
    claims: web::ReqData<TokenClaims>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse, AppError> {
    tokens.delete_token_record(&claims.uid).await?;

    tracing::info!(user_id = %claims.uid, "User logged out");

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Logged out" })))
}
