use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{AgentError, AgentResult};
use super::types::{AgentResponse, AgentTrace, AgentType, QuantumMetrics};
use super::workflow::Workflow;

pub const MIN_ITERATIONS: u32 = 1;
pub const MAX_ITERATIONS: u32 = 20;

fn all_agents() -> Vec<AgentType> {
    AgentType::ALL.to_vec()
}

fn default_max_iterations() -> u32 {
    5
}

fn default_temperature() -> f32 {
    0.7
}

fn default_true() -> bool {
    true
}

/// Inference request routed through the lattice
#[derive(Debug, Clone, Deserialize)]
pub struct AuraRequest {
    pub prompt: String,
    #[serde(default)]
    pub session_id: Option<Uuid>,
    #[serde(default = "all_agents")]
    pub agents_enabled: Vec<AgentType>,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub stream: bool,
    #[serde(default)]
    pub include_traces: bool,
    #[serde(default = "default_true")]
    pub quantum_enhanced: bool,
    /// Preferred quantum backend, passed through to the metrics gateway
    #[serde(default)]
    pub quantum_backend: Option<String>,
}

impl AuraRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            session_id: None,
            agents_enabled: all_agents(),
            max_iterations: default_max_iterations(),
            temperature: default_temperature(),
            stream: false,
            include_traces: false,
            quantum_enhanced: true,
            quantum_backend: None,
        }
    }

    pub fn validate(&self) -> AgentResult<()> {
        if self.prompt.trim().is_empty() {
            return Err(AgentError::InvalidRequest("Prompt cannot be empty".to_string()));
        }
        if !(MIN_ITERATIONS..=MAX_ITERATIONS).contains(&self.max_iterations) {
            return Err(AgentError::InvalidRequest(format!(
                "max_iterations must be between {} and {} (got {})",
                MIN_ITERATIONS, MAX_ITERATIONS, self.max_iterations
            )));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AgentError::InvalidRequest(format!(
                "temperature must be between 0 and 2 (got {})",
                self.temperature
            )));
        }
        Ok(())
    }

    pub fn is_enabled(&self, agent_type: AgentType) -> bool {
        self.agents_enabled.contains(&agent_type)
    }
}

/// Orchestrated response
#[derive(Debug, Clone, Serialize)]
pub struct AuraResponse {
    pub session_id: Uuid,
    pub workflow: Workflow,
    /// Synthesizer output; the canonical answer
    pub final_response: String,
    /// Loop responses followed by the synthesis, in execution order
    pub agent_responses: Vec<AgentResponse>,
    /// Iterations run in this session so far
    pub total_iterations: u64,
    pub execution_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consciousness_metrics: Option<QuantumMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantum_backend_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traces: Option<Vec<AgentTrace>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_from_minimal_json() {
        let request: AuraRequest = serde_json::from_str(r#"{"prompt": "hi"}"#).unwrap();
        assert_eq!(request.max_iterations, 5);
        assert_eq!(request.agents_enabled.len(), 6);
        assert!(request.quantum_enhanced);
        assert!(!request.stream);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn iteration_bounds_are_enforced() {
        let mut request = AuraRequest::new("hi");
        request.max_iterations = 0;
        assert!(matches!(request.validate(), Err(AgentError::InvalidRequest(_))));
        request.max_iterations = 21;
        assert!(request.validate().is_err());
        request.max_iterations = 20;
        assert!(request.validate().is_ok());
    }

    #[test]
    fn temperature_and_prompt_are_validated() {
        let mut request = AuraRequest::new("   ");
        assert!(request.validate().is_err());
        request.prompt = "ok".into();
        request.temperature = 2.5;
        assert!(request.validate().is_err());
    }
}
