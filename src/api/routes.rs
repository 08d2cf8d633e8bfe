use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::handlers::{chat, health, sessions, ws};
use crate::api::state::AppState;

/// Route prefix of the lattice API
pub const AURA_PREFIX: &str = "/v1/aura";

/// Builds the full application router
pub fn build_router(state: AppState) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let aura = Router::new()
        .route("/sessions", post(sessions::create_session))
        .route(
            "/sessions/:id",
            get(sessions::get_session).delete(sessions::end_session),
        )
        .route("/sessions/:id/reset", post(sessions::reset_session))
        .route("/sessions/:id/lattice", get(sessions::get_lattice))
        .route("/sessions/:id/messages", get(sessions::get_messages))
        .route("/chat", post(chat::chat))
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(health::aura_health));

    Router::new()
        .route("/health", get(health::health_check))
        .nest(AURA_PREFIX, aura)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
