// In-memory repository adapters
//
// Used when no DATABASE_URL is configured and by the test suites.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::domain::conversation::Message;
use crate::domain::repositories::{MessageRepository, SessionRepository, UsageRepository};
use crate::domain::session::Session;
use crate::domain::usage::UsageRecord;

#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self, session: &Session) -> Result<(), String> {
        let mut sessions = self.sessions.write();
        if sessions.contains_key(&session.id()) {
            return Err(format!("Session already exists: {}", session.id()));
        }
        sessions.insert(session.id(), session.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>, String> {
        Ok(self.sessions.read().get(&id).cloned())
    }

    async fn end(&self, session: &Session) -> Result<(), String> {
        match self.sessions.write().get_mut(&session.id()) {
            Some(stored) => {
                *stored = session.clone();
                Ok(())
            }
            None => Err(format!("Session not found: {}", session.id())),
        }
    }
}

#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: RwLock<HashMap<Uuid, Vec<Message>>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn save(&self, session_id: Uuid, message: &Message) -> Result<(), String> {
        self.messages
            .write()
            .entry(session_id)
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn history(&self, session_id: Uuid, limit: usize) -> Result<Vec<Message>, String> {
        let messages = self.messages.read();
        let Some(all) = messages.get(&session_id) else {
            return Ok(Vec::new());
        };
        let skip = all.len().saturating_sub(limit);
        Ok(all[skip..].to_vec())
    }

    async fn count(&self, session_id: Uuid) -> Result<usize, String> {
        Ok(self.messages.read().get(&session_id).map_or(0, Vec::len))
    }
}

#[derive(Default)]
pub struct InMemoryUsageRepository {
    records: RwLock<Vec<UsageRecord>>,
}

impl InMemoryUsageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<UsageRecord> {
        self.records.read().clone()
    }
}

#[async_trait]
impl UsageRepository for InMemoryUsageRepository {
    async fn log_usage(&self, record: &UsageRecord) -> Result<(), String> {
        self.records.write().push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::DEFAULT_SESSION_TYPE;
    use crate::domain::usage::UsageType;
    use serde_json::Map;

    #[tokio::test]
    async fn session_create_find_end() {
        let repo = InMemorySessionRepository::new();
        let (mut session, _) = Session::new(Uuid::new_v4(), DEFAULT_SESSION_TYPE, Map::new()).unwrap();

        repo.create(&session).await.unwrap();
        assert!(repo.create(&session).await.is_err());

        session.end().unwrap();
        repo.end(&session).await.unwrap();

        let stored = repo.find_by_id(session.id()).await.unwrap().unwrap();
        assert!(!stored.is_active());
        assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn history_returns_newest_window_oldest_first() {
        let repo = InMemoryMessageRepository::new();
        let session_id = Uuid::new_v4();
        for i in 0..5 {
            repo.save(session_id, &Message::user(format!("m{i}"))).await.unwrap();
        }

        let window: Vec<String> = repo
            .history(session_id, 3)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(window, vec!["m2", "m3", "m4"]);
        assert_eq!(repo.count(session_id).await.unwrap(), 5);
        assert!(repo.history(Uuid::new_v4(), 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn usage_is_recorded() {
        let repo = InMemoryUsageRepository::new();
        let record = UsageRecord::new(Uuid::new_v4(), Uuid::new_v4(), UsageType::AgentCall, 4);
        repo.log_usage(&record).await.unwrap();
        assert_eq!(repo.records(), vec![record]);
    }
}
