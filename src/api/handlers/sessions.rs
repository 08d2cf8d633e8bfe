use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::agents::lattice::AgentLattice;
use crate::agents::types::AgentSnapshot;
use crate::api::access::{active_session, orchestrator_for, owned_session};
use crate::api::errors::ApiError;
use crate::api::middleware::AuthUser;
use crate::api::state::AppState;
use crate::domain::conversation::Message;
use crate::domain::session::{Session, DEFAULT_SESSION_TYPE};

const DEFAULT_MESSAGE_LIMIT: usize = 50;
const MAX_MESSAGE_LIMIT: usize = 500;

/// Request body for session creation; every field is optional
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    pub session_type: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub session_type: String,
    pub status: String,
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id(),
            user_id: session.user_id(),
            session_type: session.session_type().to_string(),
            status: session.status().to_string(),
            metadata: session.metadata().clone(),
            created_at: session.created_at(),
            ended_at: session.ended_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionDetailResponse {
    #[serde(flatten)]
    pub session: SessionResponse,
    pub message_count: usize,
    pub total_iterations: u64,
    /// Empty when no orchestrator is loaded for the session
    pub agents: Vec<AgentSnapshot>,
}

#[derive(Debug, Serialize)]
pub struct SessionActionResponse {
    pub session_id: Uuid,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub session_id: Uuid,
    pub count: usize,
    pub messages: Vec<Message>,
}

/// Create a new session and its orchestrator
///
/// POST /v1/aura/sessions
pub async fn create_session(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    body: Option<Json<CreateSessionRequest>>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let session_type = req.session_type.unwrap_or_else(|| DEFAULT_SESSION_TYPE.to_string());

    let (session, _events) = Session::new(user_id, session_type, req.metadata).map_err(ApiError::bad_request)?;

    state
        .repos
        .sessions
        .create(&session)
        .await
        .map_err(|e| ApiError::internal_server_error(format!("Failed to create session: {}", e)))?;

    state
        .orchestrators
        .get_or_create(session.id(), user_id, Vec::new());

    tracing::info!(session_id = %session.id(), %user_id, "Session created");
    Ok((StatusCode::CREATED, Json(SessionResponse::from(&session))))
}

/// Get session info with agent snapshots
///
/// GET /v1/aura/sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionDetailResponse>, ApiError> {
    let session = owned_session(&state, session_id, user_id).await?;

    let message_count = state
        .repos
        .messages
        .count(session_id)
        .await
        .map_err(ApiError::internal_server_error)?;

    let (total_iterations, agents) = match state.orchestrators.get(session_id) {
        Some(orchestrator) => (orchestrator.total_iterations(), orchestrator.agent_snapshots()),
        None => (0, Vec::new()),
    };

    Ok(Json(SessionDetailResponse {
        session: SessionResponse::from(&session),
        message_count,
        total_iterations,
        agents,
    }))
}

/// End a session and release its orchestrator
///
/// DELETE /v1/aura/sessions/:id
pub async fn end_session(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionActionResponse>, ApiError> {
    let mut session = owned_session(&state, session_id, user_id).await?;

    session.end().map_err(ApiError::bad_request)?;
    state
        .repos
        .sessions
        .end(&session)
        .await
        .map_err(|e| ApiError::internal_server_error(format!("Failed to end session: {}", e)))?;

    if let Some(orchestrator) = state.orchestrators.remove(session_id) {
        orchestrator.close().await;
    }

    tracing::info!(%session_id, "Session ended");
    Ok(Json(SessionActionResponse {
        session_id,
        status: session.status().to_string(),
    }))
}

/// Reset conversation, iteration counter and agents
///
/// POST /v1/aura/sessions/:id/reset
pub async fn reset_session(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionActionResponse>, ApiError> {
    let session = active_session(&state, session_id, user_id).await?;

    orchestrator_for(&state, &session).await?.reset().await;

    Ok(Json(SessionActionResponse {
        session_id,
        status: "reset".to_string(),
    }))
}

/// Current lattice of a loaded session
///
/// GET /v1/aura/sessions/:id/lattice
pub async fn get_lattice(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(session_id): Path<Uuid>,
) -> Result<Json<AgentLattice>, ApiError> {
    owned_session(&state, session_id, user_id).await?;

    let orchestrator = state
        .orchestrators
        .get(session_id)
        .ok_or_else(|| ApiError::not_found(format!("No active orchestrator for session {}", session_id)))?;

    Ok(Json(orchestrator.lattice()))
}

/// Persisted conversation history, oldest first
///
/// GET /v1/aura/sessions/:id/messages?limit=
pub async fn get_messages(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(session_id): Path<Uuid>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<MessagesResponse>, ApiError> {
    owned_session(&state, session_id, user_id).await?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_MESSAGE_LIMIT)
        .clamp(1, MAX_MESSAGE_LIMIT);

    let messages = state
        .repos
        .messages
        .history(session_id, limit)
        .await
        .map_err(ApiError::internal_server_error)?;

    Ok(Json(MessagesResponse {
        session_id,
        count: messages.len(),
        messages,
    }))
}
