use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::auth::jwt::{authenticate, bearer_token};

/// Authenticated caller of a protected route
///
/// Usage:
/// ```rust,ignore
/// async fn protected_handler(AuthUser(user_id): AuthUser) -> String {
///     format!("Hello user {}", user_id)
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let token = bearer_token(header)?;
        let user_id = authenticate(Some(token), &state.jwt_secret)?;

        Ok(AuthUser(user_id))
    }
}
