use std::sync::Arc;

use sqlx::PgPool;

use crate::agents::agent::AgentSettings;
use crate::agents::completion::CompletionService;
use crate::agents::metrics::MetricsService;
use crate::agents::orchestrator::OrchestratorDeps;
use crate::agents::store::{InMemoryOrchestratorStore, OrchestratorStore};
use crate::domain::repositories::{MessageRepository, SessionRepository, UsageRepository};
use crate::infrastructure::repositories::{
    InMemoryMessageRepository, InMemorySessionRepository, InMemoryUsageRepository,
    PostgresMessageRepository, PostgresSessionRepository, PostgresUsageRepository,
};
use crate::realtime::ConnectionManager;

/// Persistence ports used by the handlers
#[derive(Clone)]
pub struct Repositories {
    pub sessions: Arc<dyn SessionRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub usage: Arc<dyn UsageRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            sessions: Arc::new(PostgresSessionRepository::new(pool.clone())),
            messages: Arc::new(PostgresMessageRepository::new(pool.clone())),
            usage: Arc::new(PostgresUsageRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            sessions: Arc::new(InMemorySessionRepository::new()),
            messages: Arc::new(InMemoryMessageRepository::new()),
            usage: Arc::new(InMemoryUsageRepository::new()),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub orchestrators: Arc<dyn OrchestratorStore>,
    pub connections: Arc<ConnectionManager>,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    /// Wires the orchestrator store to the connection manager so progress
    /// events reach websocket clients
    pub fn new(
        repos: Repositories,
        completion: Arc<dyn CompletionService>,
        metrics: Arc<dyn MetricsService>,
        settings: AgentSettings,
        jwt_secret: &str,
    ) -> Self {
        let connections = Arc::new(ConnectionManager::new());
        let deps = OrchestratorDeps {
            completion,
            metrics,
            events: connections.clone(),
            settings,
        };

        Self {
            repos,
            orchestrators: Arc::new(InMemoryOrchestratorStore::new(deps)),
            connections,
            jwt_secret: Arc::from(jwt_secret),
        }
    }
}
