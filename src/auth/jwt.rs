// JWT token creation and verification
// Bearer tokens for the HTTP API, `?token=` for websockets; 8-hour expiry

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Token lifetime
pub const TOKEN_TTL_HOURS: i64 = 8;

/// JWT claims structure
///
/// # Fields
/// * `sub` - Subject (user_id)
/// * `exp` - Expiry time (seconds since epoch)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing authorization token")]
    Missing,

    #[error("Invalid authorization format. Use: Bearer <token>")]
    Malformed,

    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// Creates a signed token for `user_id`
///
/// AURA only verifies tokens; issuing them is for operators and tests.
///
/// # Arguments
/// * `user_id` - Becomes the `sub` claim
/// * `secret` - HS256 signing key
///
/// # Returns
/// * `Ok(String)` - Encoded token valid for `TOKEN_TTL_HOURS`
/// * `Err(String)` - If encoding fails
///
/// # Example
/// ```
/// use aura_api::auth::jwt::{create_token, verify_token};
/// use uuid::Uuid;
///
/// let user_id = Uuid::new_v4();
/// let token = create_token(user_id, "secret").expect("valid token");
/// assert_eq!(verify_token(&token, "secret").unwrap().sub, user_id);
/// ```
pub fn create_token(user_id: Uuid, secret: &str) -> Result<String, String> {
    let expiry = Utc::now() + Duration::hours(TOKEN_TTL_HOURS);
    let claims = Claims {
        sub: user_id,
        exp: expiry.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| e.to_string())
}

/// Verifies signature and expiry (HS256)
///
/// # Arguments
/// * `token` - Encoded token, without any `Bearer ` prefix
/// * `secret` - Key the token was signed with
///
/// # Returns
/// * `Ok(Claims)` - Decoded claims of a valid, unexpired token
/// * `Err(String)` - Bad signature, malformed token or expired
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

/// Extracts the token from an `Authorization` header value
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::Missing)?;
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::Malformed)
}

/// Resolves a raw token to the user it was issued for
///
/// Shared by the `AuthUser` extractor and the websocket handshake.
///
/// # Arguments
/// * `token` - Token as received; `None` or empty counts as missing
/// * `secret` - Key used by `verify_token`
///
/// # Returns
/// * `Ok(Uuid)` - The token's subject
/// * `Err(AuthError::Missing)` - No token supplied
/// * `Err(AuthError::Invalid)` - Verification failed
///
/// # Example
/// ```
/// use aura_api::auth::jwt::{authenticate, create_token, AuthError};
/// use uuid::Uuid;
///
/// let user_id = Uuid::new_v4();
/// let token = create_token(user_id, "secret").unwrap();
/// assert_eq!(authenticate(Some(&token), "secret"), Ok(user_id));
/// assert_eq!(authenticate(None, "secret"), Err(AuthError::Missing));
/// ```
pub fn authenticate(token: Option<&str>, secret: &str) -> Result<Uuid, AuthError> {
    let token = token.filter(|t| !t.is_empty()).ok_or(AuthError::Missing)?;
    verify_token(token, secret)
        .map(|claims| claims.sub)
        .map_err(AuthError::Invalid)
}
