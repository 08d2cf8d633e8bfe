use axum::{extract::State, Json};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::agents::request::{AuraRequest, AuraResponse};
use crate::api::access::{active_session, orchestrator_for};
use crate::api::errors::ApiError;
use crate::api::middleware::AuthUser;
use crate::api::state::AppState;
use crate::domain::conversation::Message;
use crate::domain::session::{Session, DEFAULT_SESSION_TYPE};
use crate::domain::usage::{UsageRecord, UsageType};

/// Run a prompt through the agent lattice
///
/// POST /v1/aura/chat
///
/// Creates a session when the request names none.
pub async fn chat(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<AuraRequest>,
) -> Result<Json<AuraResponse>, ApiError> {
    request.validate()?;

    let session = match request.session_id {
        Some(session_id) => active_session(&state, session_id, user_id).await?,
        None => {
            let (session, _events) =
                Session::new(user_id, DEFAULT_SESSION_TYPE, Map::new()).map_err(ApiError::bad_request)?;
            state
                .repos
                .sessions
                .create(&session)
                .await
                .map_err(|e| ApiError::internal_server_error(format!("Failed to create session: {}", e)))?;
            tracing::info!(session_id = %session.id(), %user_id, "Session created for chat");
            session
        }
    };

    let orchestrator = orchestrator_for(&state, &session).await?;
    let response = orchestrator.process_request(&request).await?;

    persist_exchange(&state, session.id(), &request, &response).await;
    spawn_usage_logging(&state, user_id, &response);

    Ok(Json(response))
}

/// Stores the user prompt and the final answer; failures are logged only
async fn persist_exchange(state: &AppState, session_id: Uuid, request: &AuraRequest, response: &AuraResponse) {
    let agents_involved: Vec<&str> = response
        .agent_responses
        .iter()
        .map(|r| r.agent_type.as_str())
        .collect();

    let mut assistant = Message::assistant(response.final_response.clone())
        .with_metadata("execution_time_ms", Value::from(response.execution_time_ms))
        .with_metadata("agents_involved", json!(agents_involved));
    if let Some(metrics) = &response.consciousness_metrics {
        assistant = assistant.with_metadata("consciousness_metrics", json!(metrics));
    }

    for message in [Message::user(request.prompt.clone()), assistant] {
        if let Err(e) = state.repos.messages.save(session_id, &message).await {
            tracing::warn!(%session_id, role = message.role.as_str(), error = %e, "Failed to persist message");
        }
    }
}

/// Usage records go to billing off the request path
fn spawn_usage_logging(state: &AppState, user_id: Uuid, response: &AuraResponse) {
    let mut records = vec![UsageRecord::new(
        user_id,
        response.session_id,
        UsageType::AgentCall,
        u32::try_from(response.agent_responses.len()).unwrap_or(u32::MAX),
    )
    .with_metadata("total_iterations", Value::from(response.total_iterations))];

    if let Some(backend) = &response.quantum_backend_used {
        records.push(
            UsageRecord::new(user_id, response.session_id, UsageType::QuantumExec, 1)
                .with_metadata("backend", Value::from(backend.clone())),
        );
    }

    let usage = state.repos.usage.clone();
    tokio::spawn(async move {
        for record in records {
            if let Err(e) = usage.log_usage(&record).await {
                tracing::warn!(
                    session_id = %record.session_id,
                    usage_type = record.usage_type.as_str(),
                    error = %e,
                    "Failed to log usage"
                );
            }
        }
    });
}
