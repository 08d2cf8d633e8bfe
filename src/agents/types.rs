use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Maximum number of entries kept in an agent's short-term memory
pub const SHORT_TERM_CAPACITY: usize = 10;

/// Numeric metrics attached to traces and responses
pub type Metrics = BTreeMap<String, f64>;

/// Agent role. The set is closed: every session owns exactly one agent per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    Architect,
    Engineer,
    Reviewer,
    Debugger,
    Research,
    Synthesizer,
}

impl AgentType {
    /// All variants, in lattice order
    pub const ALL: [AgentType; 6] = [
        AgentType::Architect,
        AgentType::Engineer,
        AgentType::Reviewer,
        AgentType::Debugger,
        AgentType::Research,
        AgentType::Synthesizer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Architect => "architect",
            AgentType::Engineer => "engineer",
            AgentType::Reviewer => "reviewer",
            AgentType::Debugger => "debugger",
            AgentType::Research => "research",
            AgentType::Synthesizer => "synthesizer",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        AgentType::ALL.into_iter().find(|t| t.as_str() == raw)
    }
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Agent status
///
/// # Lifecycle
/// ```text
/// Idle -> Working -> Completed
///            └-----> Error
/// (any) --reset--> Idle
/// ```
/// `Active` is never entered by `process`; consumers treat it like `Working`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Idle,
    Active,
    Working,
    Completed,
    Error,
}

impl AgentStatus {
    /// True while the agent is executing a task
    pub fn is_busy(&self) -> bool {
        matches!(self, AgentStatus::Working | AgentStatus::Active)
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::Idle => write!(f, "idle"),
            AgentStatus::Active => write!(f, "active"),
            AgentStatus::Working => write!(f, "working"),
            AgentStatus::Completed => write!(f, "completed"),
            AgentStatus::Error => write!(f, "error"),
        }
    }
}

fn unit_interval(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Role vector of an agent. All scalar fields stay within [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentVector {
    role: AgentType,
    weight: f64,
    decoherence_resistance: f64,
    optimization_score: f64,
}

impl AgentVector {
    pub fn new(role: AgentType, weight: f64, decoherence_resistance: f64) -> Self {
        Self {
            role,
            weight: unit_interval(weight),
            decoherence_resistance: unit_interval(decoherence_resistance),
            optimization_score: 0.0,
        }
    }

    pub fn role(&self) -> AgentType {
        self.role
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn decoherence_resistance(&self) -> f64 {
        self.decoherence_resistance
    }

    pub fn optimization_score(&self) -> f64 {
        self.optimization_score
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = unit_interval(weight);
    }

    pub fn set_optimization_score(&mut self, score: f64) {
        self.optimization_score = unit_interval(score);
    }
}

/// Agent-internal memory
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgentMemory {
    short_term: VecDeque<String>,
    long_term: Map<String, Value>,
    working_context: Option<String>,
}

impl AgentMemory {
    /// Appends recent observations (oldest dropped first), merges long-term
    /// knowledge and replaces the working context when given.
    pub fn update<I>(
        &mut self,
        short_term: I,
        long_term: Option<Map<String, Value>>,
        working_context: Option<String>,
    ) where
        I: IntoIterator<Item = String>,
    {
        for entry in short_term {
            if self.short_term.len() == SHORT_TERM_CAPACITY {
                self.short_term.pop_front();
            }
            self.short_term.push_back(entry);
        }

        if let Some(knowledge) = long_term {
            self.long_term.extend(knowledge);
        }

        if working_context.is_some() {
            self.working_context = working_context;
        }
    }

    pub fn short_term(&self) -> impl Iterator<Item = &str> {
        self.short_term.iter().map(String::as_str)
    }

    pub fn short_term_len(&self) -> usize {
        self.short_term.len()
    }

    pub fn long_term(&self) -> &Map<String, Value> {
        &self.long_term
    }

    pub fn working_context(&self) -> Option<&str> {
        self.working_context.as_deref()
    }
}

/// Immutable audit record of one agent action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentTrace {
    pub timestamp: DateTime<Utc>,
    pub agent_id: String,
    pub agent_type: AgentType,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
}

/// Output of one agent invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentResponse {
    pub agent_id: String,
    pub agent_type: AgentType,
    pub response: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<AgentTrace>,
}

/// Condensed view of an earlier response handed to later agents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseDigest {
    pub agent_type: AgentType,
    pub response: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
}

impl From<&AgentResponse> for ResponseDigest {
    fn from(resp: &AgentResponse) -> Self {
        Self {
            agent_type: resp.agent_type,
            response: resp.response.clone(),
            confidence: resp.confidence,
            metrics: resp.metrics.clone(),
        }
    }
}

/// Context passed to an agent alongside its task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentContext {
    pub original_prompt: String,
    pub session_id: Uuid,
    /// Most recent earlier responses of this request
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub previous_responses: Vec<ResponseDigest>,
    /// Every response collected so far; only the Synthesizer receives these
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub agent_responses: Vec<ResponseDigest>,
    /// Sampling temperature requested by the caller
    #[serde(skip)]
    pub temperature: f32,
}

impl AgentContext {
    pub fn new(session_id: Uuid, original_prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            original_prompt: original_prompt.into(),
            session_id,
            previous_responses: Vec::new(),
            agent_responses: Vec::new(),
            temperature,
        }
    }
}

/// Point-in-time snapshot of one agent
#[derive(Debug, Clone, Serialize)]
pub struct AgentSnapshot {
    pub agent_id: String,
    pub agent_type: AgentType,
    pub status: AgentStatus,
    pub vector: AgentVector,
    pub memory: AgentMemory,
    pub traces: Vec<AgentTrace>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Auxiliary metrics returned by the quantum gateway, each clamped to [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantumMetrics {
    pub phi: f64,
    pub gamma: f64,
    pub lambda: f64,
    pub w2: f64,
}

impl QuantumMetrics {
    pub fn new(phi: f64, gamma: f64, lambda: f64, w2: f64) -> Self {
        Self {
            phi: unit_interval(phi),
            gamma: unit_interval(gamma),
            lambda: unit_interval(lambda),
            w2: unit_interval(w2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_clamps_adversarial_values() {
        let mut vector = AgentVector::new(AgentType::Engineer, 5.0, -5.0);
        assert_eq!(vector.weight(), 1.0);
        assert_eq!(vector.decoherence_resistance(), 0.0);

        vector.set_optimization_score(-5.0);
        assert_eq!(vector.optimization_score(), 0.0);
        vector.set_optimization_score(5.0);
        assert_eq!(vector.optimization_score(), 1.0);
        vector.set_optimization_score(f64::NAN);
        assert_eq!(vector.optimization_score(), 0.0);
        vector.set_weight(0.25);
        assert_eq!(vector.weight(), 0.25);
    }

    #[test]
    fn short_term_memory_drops_oldest_first() {
        let mut memory = AgentMemory::default();
        for i in 0..25 {
            memory.update([format!("entry {i}")], None, None);
            assert!(memory.short_term_len() <= SHORT_TERM_CAPACITY);
        }

        let kept: Vec<&str> = memory.short_term().collect();
        assert_eq!(kept.first(), Some(&"entry 15"));
        assert_eq!(kept.last(), Some(&"entry 24"));
    }

    #[test]
    fn bulk_short_term_update_is_capped() {
        let mut memory = AgentMemory::default();
        memory.update((0..13).map(|i| i.to_string()), None, None);
        assert_eq!(memory.short_term_len(), SHORT_TERM_CAPACITY);
        assert_eq!(memory.short_term().next(), Some("3"));
    }

    #[test]
    fn long_term_memory_merges_and_never_shrinks() {
        let mut memory = AgentMemory::default();
        let mut first = Map::new();
        first.insert("a".into(), Value::from(1));
        first.insert("b".into(), Value::from(2));
        memory.update(Vec::new(), Some(first), None);

        let mut second = Map::new();
        second.insert("b".into(), Value::from(3));
        memory.update(Vec::new(), Some(second), Some("ctx".into()));

        assert_eq!(memory.long_term().len(), 2);
        assert_eq!(memory.long_term()["b"], Value::from(3));
        assert_eq!(memory.working_context(), Some("ctx"));

        memory.update(Vec::new(), None, None);
        assert_eq!(memory.working_context(), Some("ctx"));
    }

    #[test]
    fn active_counts_as_busy() {
        assert!(AgentStatus::Active.is_busy());
        assert!(AgentStatus::Working.is_busy());
        assert!(!AgentStatus::Idle.is_busy());
        assert!(!AgentStatus::Completed.is_busy());
        assert!(!AgentStatus::Error.is_busy());
    }

    #[test]
    fn agent_type_serializes_lowercase() {
        let json = serde_json::to_string(&AgentType::Synthesizer).unwrap();
        assert_eq!(json, "\"synthesizer\"");
        let parsed: AgentType = serde_json::from_str("\"research\"").unwrap();
        assert_eq!(parsed, AgentType::Research);
    }

    #[test]
    fn quantum_metrics_are_bounded() {
        let metrics = QuantumMetrics::new(1.4, -0.2, 0.5, f64::NAN);
        assert_eq!(metrics.phi, 1.0);
        assert_eq!(metrics.gamma, 0.0);
        assert_eq!(metrics.lambda, 0.5);
        assert_eq!(metrics.w2, 0.0);
    }
}
