use async_trait::async_trait;

use crate::domain::usage::UsageRecord;

/// Sink for usage counts consumed by billing
#[async_trait]
pub trait UsageRepository: Send + Sync {
    async fn log_usage(&self, record: &UsageRecord) -> Result<(), String>;
}
