use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::state::AppState;

#[derive(Debug, Serialize)]
pub struct AuraHealth {
    pub status: &'static str,
    pub active_sessions: usize,
    pub websocket_connections: usize,
    pub timestamp: DateTime<Utc>,
}

/// Health check endpoint
///
/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}

/// Lattice service health
///
/// GET /v1/aura/health
pub async fn aura_health(State(state): State<AppState>) -> Json<AuraHealth> {
    Json(AuraHealth {
        status: "healthy",
        active_sessions: state.orchestrators.len(),
        websocket_connections: state.connections.connection_count(None).await,
        timestamp: Utc::now(),
    })
}
