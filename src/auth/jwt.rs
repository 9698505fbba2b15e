/// JWT Token Signing and Validation
///
/// HS256 over a shared secret. Validation never panics: every failure is
/// reported as one of `SignatureInvalid`, `MalformedClaims` or `TokenExpired`.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::TokenClaims;
use crate::error::AuthError;

/// Sign claims with the shared secret
///
/// # Errors
/// Returns `SigningFailed` if encoding fails
pub fn sign_claims(claims: &TokenClaims, secret: &str) -> Result<String, AuthError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::SigningFailed(e.to_string()))
}

/// Verify a token and extract its claims
///
/// # Errors
/// - `SignatureInvalid` if the token cannot be parsed or the signature does not match
/// - `MalformedClaims` if the payload does not have the claims shape
/// - `TokenExpired` if `exp` is in the past
pub fn verify_token(token: &str, secret: &str) -> Result<TokenClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);

    // A header that does not parse means the token itself is garbage.
    decode_header(token).map_err(|e| {
        tracing::debug!("JWT header error: {}", e);
        AuthError::SignatureInvalid
    })?;

    decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("JWT validation error: {}", e);
        classify(e.kind())
    })
}

fn classify(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::Json(_) | ErrorKind::MissingRequiredClaim(_) => AuthError::MalformedClaims,
        _ => AuthError::SignatureInvalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::Identity;

    const SECRET: &str = "test-secret-key-at-least-32-characters-long";

    fn identity() -> Identity {
        Identity {
            email: "test@example.com".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            user_id: "user-1".to_string(),
        }
    }

    #[test]
    fn test_sign_and_verify_token() {
        let token = sign_claims(&TokenClaims::access(&identity(), 3600), SECRET)
            .expect("Failed to sign token");
        let claims = verify_token(&token, SECRET).expect("Failed to verify token");

        assert_eq!(claims.identity(), identity());
    }

    #[test]
    fn test_garbage_token() {
        let result = verify_token("invalid.token.here", SECRET);
        assert!(matches!(result, Err(AuthError::SignatureInvalid)));
    }

    #[test]
    fn test_tampered_token() {
        let token = sign_claims(&TokenClaims::access(&identity(), 3600), SECRET)
            .expect("Failed to sign token");

        let tampered = format!("{}X", token);
        assert!(matches!(
            verify_token(&tampered, SECRET),
            Err(AuthError::SignatureInvalid)
        ));
    }

    #[test]
    fn test_wrong_secret() {
        let token = sign_claims(&TokenClaims::access(&identity(), 3600), "another-secret")
            .expect("Failed to sign token");

        assert!(matches!(
            verify_token(&token, SECRET),
            Err(AuthError::SignatureInvalid)
        ));
    }

    #[test]
    fn test_expired_token() {
        let token = sign_claims(&TokenClaims::access(&identity(), -60), SECRET)
            .expect("Failed to sign token");

        assert!(matches!(
            verify_token(&token, SECRET),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_claims_with_wrong_shape() {
        let exp = chrono::Utc::now().timestamp() + 3600;
        let payload = serde_json::json!({ "exp": exp, "uid": 42 });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("Failed to encode payload");

        assert!(matches!(
            verify_token(&token, SECRET),
            Err(AuthError::MalformedClaims)
        ));
    }

    #[test]
    fn test_claims_without_expiry() {
        let payload = serde_json::json!({ "uid": "user-1" });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("Failed to encode payload");

        assert!(matches!(
            verify_token(&token, SECRET),
            Err(AuthError::MalformedClaims)
        ));
    }
}
