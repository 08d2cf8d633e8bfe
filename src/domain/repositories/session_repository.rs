use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::session::Session;

/// Repository trait for the Session aggregate
///
/// Defines the contract for persisting and retrieving sessions.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a newly created session
    async fn create(&self, session: &Session) -> Result<(), String>;

    /// Find a session by its ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>, String>;

    /// Persist the ended state of a session
    async fn end(&self, session: &Session) -> Result<(), String>;
}
