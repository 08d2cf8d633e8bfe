use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::agents::errors::AgentError;
use crate::auth::AuthError;

/// API error type with HTTP status code and message
///
/// Rendered as `{"error": message}`; 5xx responses are also logged.
///
/// # Example
/// ```
/// use aura_api::api::errors::ApiError;
/// use axum::http::StatusCode;
///
/// let err = ApiError::not_found("Session not found");
/// assert_eq!(err.status, StatusCode::NOT_FOUND);
/// assert_eq!(err.message, "Session not found");
/// ```
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    /// Creates a new API error
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Creates a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Creates a 401 Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// Creates a 403 Forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// Creates a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Creates a 500 Internal Server Error
    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "Request failed");
        }

        let body = Json(json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<String> for ApiError {
    fn from(message: String) -> Self {
        Self::internal_server_error(message)
    }
}

/// Maps orchestration failures to HTTP statuses
///
/// # Returns
/// * `400` - `InvalidRequest` and `SessionClosed`
/// * `500` - Every other agent error
impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::InvalidRequest(message) => Self::bad_request(message),
            closed @ AgentError::SessionClosed(_) => Self::bad_request(closed.to_string()),
            other => Self::internal_server_error(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::unauthorized(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_errors_map_to_status() {
        let invalid: ApiError = AgentError::InvalidRequest("bad".into()).into();
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);

        let closed: ApiError = AgentError::SessionClosed(uuid::Uuid::nil()).into();
        assert_eq!(closed.status, StatusCode::BAD_REQUEST);

        let config: ApiError = AgentError::ConfigError("x".into()).into();
        assert_eq!(config.status, StatusCode::INTERNAL_SERVER_ERROR);

        let auth: ApiError = AuthError::Missing.into();
        assert_eq!(auth.status, StatusCode::UNAUTHORIZED);
    }
}
