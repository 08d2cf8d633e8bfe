use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use aura_api::agents::agent::AgentSettings;
use aura_api::agents::completion::{CompletionService, ScriptedCompletion};
use aura_api::agents::metrics::{DisabledMetricsService, MetricsService};
use aura_api::api::{build_router, AppState, Repositories};
use aura_api::config::AppConfig;
use aura_api::infrastructure::llm::{AnthropicCompletionService, AnthropicConfig};
use aura_api::infrastructure::quantum::HttpMetricsService;
use sqlx::postgres::PgPoolOptions;

const GATEWAY_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().expect("Invalid configuration");

    let repos = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connected successfully");
            Repositories::postgres(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, sessions are kept in memory");
            Repositories::in_memory()
        }
    };

    let completion: Arc<dyn CompletionService> = match &config.anthropic_api_key {
        Some(api_key) => Arc::new(AnthropicCompletionService::new(AnthropicConfig {
            api_key: api_key.clone(),
            base_url: config.anthropic_base_url.clone(),
            model: config.model.clone(),
        })),
        None => {
            tracing::warn!("ANTHROPIC_API_KEY not set, agents echo their prompts");
            Arc::new(ScriptedCompletion::echo())
        }
    };

    let metrics: Arc<dyn MetricsService> = match &config.quantum_gateway_url {
        Some(url) => Arc::new(
            HttpMetricsService::new(url.clone(), GATEWAY_TIMEOUT).expect("Failed to build gateway client"),
        ),
        None => {
            tracing::info!("QUANTUM_GATEWAY_URL not set, quantum metrics disabled");
            Arc::new(DisabledMetricsService)
        }
    };

    let state = AppState::new(
        repos,
        completion,
        metrics,
        AgentSettings {
            call_timeout: config.agent_timeout,
        },
        &config.jwt_secret,
    );

    let app = build_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app)
        .await
        .expect("Server failed");
}
