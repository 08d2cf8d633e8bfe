use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use crate::domain::repositories::UsageRepository;
use crate::domain::usage::UsageRecord;

/// PostgreSQL implementation of UsageRepository
pub struct PostgresUsageRepository {
    pool: PgPool,
}

impl PostgresUsageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageRepository for PostgresUsageRepository {
    async fn log_usage(&self, record: &UsageRecord) -> Result<(), String> {
        sqlx::query(
            r#"
            INSERT INTO aura_usage (user_id, session_id, usage_type, quantity, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.user_id)
        .bind(record.session_id)
        .bind(record.usage_type.as_str())
        .bind(i32::try_from(record.quantity).unwrap_or(i32::MAX))
        .bind(Value::Object(record.metadata.clone()))
        .bind(record.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to log usage: {}", e))?;

        Ok(())
    }
}
