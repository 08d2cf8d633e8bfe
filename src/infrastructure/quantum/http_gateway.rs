use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::agents::metrics::{MetricsError, MetricsService, QuantumReading};
use crate::agents::types::QuantumMetrics;

/// Payload of `GET /v1/metrics`
#[derive(Debug, Deserialize)]
struct GatewayReading {
    phi: f64,
    gamma: f64,
    lambda: f64,
    w2: f64,
    #[serde(default)]
    backend: Option<String>,
}

/// Metrics service backed by the quantum gateway's HTTP API.
///
/// `204 No Content` means no backend is currently available.
pub struct HttpMetricsService {
    base_url: String,
    http: reqwest::Client,
}

impl HttpMetricsService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, MetricsError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MetricsError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into(),
            http,
        })
    }
}

fn into_reading(payload: GatewayReading, backend_hint: Option<&str>) -> QuantumReading {
    QuantumReading {
        metrics: QuantumMetrics::new(payload.phi, payload.gamma, payload.lambda, payload.w2),
        backend: payload
            .backend
            .or_else(|| backend_hint.map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string()),
    }
}

#[async_trait]
impl MetricsService for HttpMetricsService {
    async fn compute_metrics(
        &self,
        backend_hint: Option<&str>,
    ) -> Result<Option<QuantumReading>, MetricsError> {
        let url = format!("{}/v1/metrics", self.base_url.trim_end_matches('/'));
        let mut request = self.http.get(&url);
        if let Some(backend) = backend_hint {
            request = request.query(&[("backend", backend)]);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| MetricsError::Transport(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(MetricsError::Transport(format!("gateway returned {}", status)));
        }

        let payload: GatewayReading = resp
            .json()
            .await
            .map_err(|e| MetricsError::Decode(e.to_string()))?;

        Ok(Some(into_reading(payload, backend_hint)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readings_are_clamped_and_named() {
        let payload: GatewayReading =
            serde_json::from_str(r#"{"phi": 1.7, "gamma": 0.2, "lambda": -1, "w2": 0.4}"#).unwrap();
        let reading = into_reading(payload, Some("ibm_brisbane"));

        assert_eq!(reading.metrics, QuantumMetrics::new(1.0, 0.2, 0.0, 0.4));
        assert_eq!(reading.backend, "ibm_brisbane");
    }

    #[test]
    fn gateway_backend_wins_over_hint() {
        let payload: GatewayReading = serde_json::from_str(
            r#"{"phi": 0.1, "gamma": 0.2, "lambda": 0.3, "w2": 0.4, "backend": "ibm_kyiv"}"#,
        )
        .unwrap();
        assert_eq!(into_reading(payload, Some("ibm_brisbane")).backend, "ibm_kyiv");
    }
}
