/// Bearer Token Middleware
///
/// Validates the access token from the Authorization header, checks that it
/// is still the token on record for its user, and injects the claims into
/// request extensions for the route handlers.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{TokenClaims, TokenService};
use crate::error::{AppError, AuthError, DatabaseError};

/// Middleware for routes that need a live session
pub struct JwtMiddleware {
    tokens: TokenService,
}

impl JwtMiddleware {
    pub fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            tokens: self.tokens.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    tokens: TokenService,
}

/// Extract the token from `Authorization: Bearer <token>`
fn bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Validate the token and confirm it belongs to a live session
async fn authenticate(tokens: &TokenService, token: &str) -> Result<TokenClaims, AppError> {
    let claims = tokens.validate_token(token)?;

    // Refresh tokens carry no identity and cannot authenticate a request.
    if claims.uid.is_empty() {
        return Err(AuthError::MalformedClaims.into());
    }

    match tokens.get_user_id_by_token(token).await {
        Ok(owner) if owner == claims.uid => Ok(claims),
        Ok(owner) => {
            tracing::warn!(
                claimed = %claims.uid,
                owner = %owner,
                "Token owner does not match claims"
            );
            Err(AuthError::SessionEnded.into())
        }
        Err(AppError::Database(DatabaseError::NotFound(_))) => Err(AuthError::SessionEnded.into()),
        Err(e) => Err(e),
    }
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = bearer_token(&req);
        let tokens = self.tokens.clone();
        let service = self.service.clone();

        Box::pin(async move {
            let token = match token {
                Some(token) => token,
                None => {
                    tracing::warn!(path = %req.path(), "Missing or invalid Authorization header");
                    return Err(AppError::Auth(AuthError::MissingToken).into());
                }
            };

            let claims = authenticate(&tokens, &token).await.map_err(|e| {
                tracing::warn!(path = %req.path(), error = %e, "Request authentication failed");
                Error::from(e)
            })?;

            tracing::debug!(user_id = %claims.uid, "Bearer token validated");
            req.extensions_mut().insert(claims);

            service.call(req).await
        })
    }
}
