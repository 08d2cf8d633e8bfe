use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agents::lattice::AgentLattice;
use crate::agents::types::{AgentStatus, AgentType, Metrics, QuantumMetrics};

/// Frame pushed to websocket clients
#[derive(Debug, Clone, Serialize)]
pub struct OutboundEvent {
    pub session_id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl OutboundEvent {
    pub fn new(session_id: Uuid, payload: EventPayload) -> Self {
        Self {
            session_id,
            timestamp: Utc::now(),
            payload,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.payload.kind()
    }
}

/// Kind-specific part of an outbound frame, tagged by `type`
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    Connected {
        connection_id: Uuid,
        message: String,
    },
    Pong,
    AgentUpdate {
        agent_id: String,
        agent_type: AgentType,
        status: AgentStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        metrics: Option<Metrics>,
    },
    LatticeUpdate {
        lattice: Box<AgentLattice>,
    },
    ResponseChunk {
        agent_id: String,
        agent_type: AgentType,
        content: String,
        is_final: bool,
    },
    QuantumMetrics {
        metrics: QuantumMetrics,
        backend: String,
    },
    Error {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        agent_type: Option<AgentType>,
    },
    Status {
        connections: usize,
    },
}

impl EventPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::Connected { .. } => "connected",
            EventPayload::Pong => "pong",
            EventPayload::AgentUpdate { .. } => "agent_update",
            EventPayload::LatticeUpdate { .. } => "lattice_update",
            EventPayload::ResponseChunk { .. } => "response_chunk",
            EventPayload::QuantumMetrics { .. } => "quantum_metrics",
            EventPayload::Error { .. } => "error",
            EventPayload::Status { .. } => "status",
        }
    }
}

/// Frame received from websocket clients
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    Ping,
    SubscribeLattice,
    UnsubscribeLattice,
    GetStatus,
    #[serde(other)]
    Unknown,
}
