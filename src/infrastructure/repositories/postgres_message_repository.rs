use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::agents::types::AgentType;
use crate::domain::conversation::{Message, MessageRole};
use crate::domain::repositories::MessageRepository;

/// PostgreSQL implementation of MessageRepository
pub struct PostgresMessageRepository {
    pool: PgPool,
}

impl PostgresMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn message_from_row(row: &PgRow) -> Result<Message, String> {
    let read = |e: sqlx::Error| format!("Failed to read message row: {}", e);

    let role: String = row.try_get("role").map_err(read)?;
    let agent_type: Option<String> = row.try_get("agent_type").map_err(read)?;
    let metadata = match row.try_get::<Value, _>("metadata").map_err(read)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    Ok(Message {
        role: MessageRole::parse(&role).ok_or_else(|| format!("Unknown message role: {}", role))?,
        content: row.try_get("content").map_err(read)?,
        agent_id: row.try_get("agent_id").map_err(read)?,
        agent_type: agent_type.as_deref().and_then(AgentType::parse),
        metadata,
        timestamp: row.try_get::<DateTime<Utc>, _>("created_at").map_err(read)?,
    })
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    async fn save(&self, session_id: Uuid, message: &Message) -> Result<(), String> {
        sqlx::query(
            r#"
            INSERT INTO aura_messages (session_id, role, content, agent_id, agent_type, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(session_id)
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(message.agent_id.as_deref())
        .bind(message.agent_type.map(|t| t.as_str()))
        .bind(Value::Object(message.metadata.clone()))
        .bind(message.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to save message: {}", e))?;

        Ok(())
    }

    async fn history(&self, session_id: Uuid, limit: usize) -> Result<Vec<Message>, String> {
        // newest `limit` rows, flipped back to chronological order
        let rows = sqlx::query(
            r#"
            SELECT role, content, agent_id, agent_type, metadata, created_at
            FROM (
                SELECT id, role, content, agent_id, agent_type, metadata, created_at
                FROM aura_messages
                WHERE session_id = $1
                ORDER BY id DESC
                LIMIT $2
            ) recent
            ORDER BY id ASC
            "#,
        )
        .bind(session_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| format!("Failed to load message history: {}", e))?;

        rows.iter().map(message_from_row).collect()
    }

    async fn count(&self, session_id: Uuid) -> Result<usize, String> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM aura_messages WHERE session_id = $1")
            .bind(session_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| format!("Failed to count messages: {}", e))?;

        Ok(count.max(0) as usize)
    }
}
