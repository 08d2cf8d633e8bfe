use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::conversation::Message;

/// Repository trait for persisted conversation messages
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Append a message to a session's history
    async fn save(&self, session_id: Uuid, message: &Message) -> Result<(), String>;

    /// Most recent `limit` messages of a session, oldest first
    async fn history(&self, session_id: Uuid, limit: usize) -> Result<Vec<Message>, String>;

    /// Number of persisted messages for a session
    async fn count(&self, session_id: Uuid) -> Result<usize, String>;
}
