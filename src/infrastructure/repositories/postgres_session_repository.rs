use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::repositories::SessionRepository;
use crate::domain::session::value_objects::SessionStatus;
use crate::domain::session::Session;

/// PostgreSQL implementation of SessionRepository
///
/// Queries are checked at runtime so the crate builds without a database.
pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    /// Creates a new PostgresSessionRepository
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool for PostgreSQL
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn session_from_row(row: &PgRow) -> Result<Session, String> {
    let read = |e: sqlx::Error| format!("Failed to read session row: {}", e);

    let status: String = row.try_get("status").map_err(read)?;
    let metadata = match row.try_get::<Value, _>("metadata").map_err(read)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    Ok(Session::from_persistence(
        row.try_get("id").map_err(read)?,
        row.try_get("user_id").map_err(read)?,
        row.try_get("session_type").map_err(read)?,
        SessionStatus::parse(&status)?,
        metadata,
        row.try_get::<DateTime<Utc>, _>("created_at").map_err(read)?,
        row.try_get::<Option<DateTime<Utc>>, _>("ended_at").map_err(read)?,
    ))
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    async fn create(&self, session: &Session) -> Result<(), String> {
        sqlx::query(
            r#"
            INSERT INTO aura_sessions (id, user_id, session_type, status, metadata, created_at, ended_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(session.id())
        .bind(session.user_id())
        .bind(session.session_type())
        .bind(session.status().to_string())
        .bind(Value::Object(session.metadata().clone()))
        .bind(session.created_at())
        .bind(session.ended_at())
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to create session: {}", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>, String> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, session_type, status, metadata, created_at, ended_at
            FROM aura_sessions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| format!("Failed to find session by id: {}", e))?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn end(&self, session: &Session) -> Result<(), String> {
        let result = sqlx::query(
            r#"
            UPDATE aura_sessions
            SET status = $2, ended_at = $3
            WHERE id = $1
            "#,
        )
        .bind(session.id())
        .bind(session.status().to_string())
        .bind(session.ended_at())
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to end session: {}", e))?;

        if result.rows_affected() == 0 {
            return Err(format!("Session not found: {}", session.id()));
        }

        Ok(())
    }
}
