use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Kind of billable unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageType {
    AgentCall,
    QuantumExec,
    Message,
}

impl UsageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageType::AgentCall => "agent_call",
            UsageType::QuantumExec => "quantum_exec",
            UsageType::Message => "message",
        }
    }
}

/// Per-call usage count handed to the billing side channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageRecord {
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub usage_type: UsageType,
    pub quantity: u32,
    pub metadata: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl UsageRecord {
    pub fn new(user_id: Uuid, session_id: Uuid, usage_type: UsageType, quantity: u32) -> Self {
        Self {
            user_id,
            session_id,
            usage_type,
            quantity,
            metadata: Map::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}
