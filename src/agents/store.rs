use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use super::orchestrator::{Orchestrator, OrchestratorDeps};
use crate::domain::conversation::Message;

/// Registry of live orchestrators, at most one per session
pub trait OrchestratorStore: Send + Sync {
    fn get(&self, session_id: Uuid) -> Option<Arc<Orchestrator>>;

    /// Returns the existing orchestrator or builds one seeded with `history`.
    ///
    /// `history` is ignored when an orchestrator already exists.
    fn get_or_create(&self, session_id: Uuid, user_id: Uuid, history: Vec<Message>) -> Arc<Orchestrator>;

    fn remove(&self, session_id: Uuid) -> Option<Arc<Orchestrator>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local store; orchestrators live until their session ends
pub struct InMemoryOrchestratorStore {
    deps: OrchestratorDeps,
    orchestrators: Mutex<HashMap<Uuid, Arc<Orchestrator>>>,
}

impl InMemoryOrchestratorStore {
    pub fn new(deps: OrchestratorDeps) -> Self {
        Self {
            deps,
            orchestrators: Mutex::new(HashMap::new()),
        }
    }
}

impl OrchestratorStore for InMemoryOrchestratorStore {
    fn get(&self, session_id: Uuid) -> Option<Arc<Orchestrator>> {
        self.orchestrators.lock().get(&session_id).cloned()
    }

    fn get_or_create(&self, session_id: Uuid, user_id: Uuid, history: Vec<Message>) -> Arc<Orchestrator> {
        self.orchestrators
            .lock()
            .entry(session_id)
            .or_insert_with(|| {
                tracing::debug!(%session_id, seeded = history.len(), "Creating orchestrator");
                Arc::new(Orchestrator::with_history(
                    session_id,
                    Some(user_id),
                    self.deps.clone(),
                    history,
                ))
            })
            .clone()
    }

    fn remove(&self, session_id: Uuid) -> Option<Arc<Orchestrator>> {
        self.orchestrators.lock().remove(&session_id)
    }

    fn len(&self) -> usize {
        self.orchestrators.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::agent::AgentSettings;
    use crate::agents::completion::ScriptedCompletion;
    use crate::agents::events::NoopEventSink;
    use crate::agents::metrics::DisabledMetricsService;

    fn store() -> InMemoryOrchestratorStore {
        InMemoryOrchestratorStore::new(OrchestratorDeps {
            completion: Arc::new(ScriptedCompletion::fixed("ok")),
            metrics: Arc::new(DisabledMetricsService),
            events: Arc::new(NoopEventSink),
            settings: AgentSettings::default(),
        })
    }

    #[test]
    fn one_orchestrator_per_session() {
        let store = store();
        let session_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let first = store.get_or_create(session_id, user_id, vec![Message::user("earlier")]);
        let second = store.get_or_create(session_id, user_id, Vec::new());

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.conversation().len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_releases_the_orchestrator() {
        let store = store();
        let session_id = Uuid::new_v4();
        store.get_or_create(session_id, Uuid::new_v4(), Vec::new());

        assert!(store.remove(session_id).is_some());
        assert!(store.get(session_id).is_none());
        assert!(store.is_empty());
    }
}
