// Session lookup shared by the HTTP and websocket handlers

use std::sync::Arc;

use uuid::Uuid;

use crate::agents::orchestrator::Orchestrator;
use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::domain::session::Session;

/// Persisted messages used to seed a lazily created orchestrator
pub const HISTORY_SEED_LIMIT: usize = 50;

/// Loads a session the caller owns: 404 when unknown, 403 when owned by someone else
pub async fn owned_session(state: &AppState, session_id: Uuid, user_id: Uuid) -> Result<Session, ApiError> {
    let session = state
        .repos
        .sessions
        .find_by_id(session_id)
        .await
        .map_err(ApiError::internal_server_error)?
        .ok_or_else(|| ApiError::not_found(format!("Session not found: {}", session_id)))?;

    if !session.is_owned_by(user_id) {
        return Err(ApiError::forbidden("Session belongs to another user"));
    }

    Ok(session)
}

/// Like [`owned_session`] but also rejects ended sessions
pub async fn active_session(state: &AppState, session_id: Uuid, user_id: Uuid) -> Result<Session, ApiError> {
    let session = owned_session(state, session_id, user_id).await?;
    if !session.is_active() {
        return Err(ApiError::bad_request(format!("Session {} has ended", session_id)));
    }
    Ok(session)
}

/// Returns the session's orchestrator, creating it from persisted history if needed.
///
/// The session is re-read after registration: an `end_session` that completed
/// while history was loading has already run its removal, so the orchestrator
/// registered here is dropped again and the caller gets a 400.
pub async fn orchestrator_for(state: &AppState, session: &Session) -> Result<Arc<Orchestrator>, ApiError> {
    if let Some(orchestrator) = state.orchestrators.get(session.id()) {
        return Ok(orchestrator);
    }

    let history = match state.repos.messages.history(session.id(), HISTORY_SEED_LIMIT).await {
        Ok(history) => history,
        Err(e) => {
            tracing::warn!(session_id = %session.id(), error = %e, "Starting orchestrator without history");
            Vec::new()
        }
    };

    let orchestrator = state
        .orchestrators
        .get_or_create(session.id(), session.user_id(), history);

    let still_active = state
        .repos
        .sessions
        .find_by_id(session.id())
        .await
        .map_err(ApiError::internal_server_error)?
        .is_some_and(|current| current.is_active());
    if !still_active {
        if let Some(stale) = state.orchestrators.remove(session.id()) {
            stale.close().await;
        }
        tracing::info!(session_id = %session.id(), "Session ended while its orchestrator was loading");
        return Err(ApiError::bad_request(format!("Session {} has ended", session.id())));
    }

    Ok(orchestrator)
}
