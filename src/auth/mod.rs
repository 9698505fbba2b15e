/// Authentication module
///
/// JWT signing/validation, the token lifecycle service, and password hashing.

mod claims;
mod jwt;
mod password;
mod token_service;

pub use claims::{Identity, TokenClaims};
pub use jwt::{sign_claims, verify_token};
pub use password::{hash_password, validate_password_strength, verify_password};
pub use token_service::{TokenPair, TokenService};
