// Auxiliary-metrics port
//
// The quantum gateway is optional: any failure degrades to "no metrics".

use async_trait::async_trait;
use thiserror::Error;

use super::types::QuantumMetrics;

#[derive(Debug, Clone, Error)]
pub enum MetricsError {
    #[error("metrics transport error: {0}")]
    Transport(String),

    #[error("malformed metrics payload: {0}")]
    Decode(String),
}

/// Metrics together with the backend that produced them
#[derive(Debug, Clone, PartialEq)]
pub struct QuantumReading {
    pub metrics: QuantumMetrics,
    pub backend: String,
}

#[async_trait]
pub trait MetricsService: Send + Sync {
    /// `Ok(None)` when no backend is available
    async fn compute_metrics(
        &self,
        backend_hint: Option<&str>,
    ) -> Result<Option<QuantumReading>, MetricsError>;
}

/// Used when no gateway is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledMetricsService;

#[async_trait]
impl MetricsService for DisabledMetricsService {
    async fn compute_metrics(
        &self,
        _backend_hint: Option<&str>,
    ) -> Result<Option<QuantumReading>, MetricsError> {
        Ok(None)
    }
}
