// Orchestrator progress events
//
// The orchestrator publishes these while it works; the real-time layer turns
// them into outbound frames. Publishing must never block orchestration.

use async_trait::async_trait;
use uuid::Uuid;

use super::lattice::AgentLattice;
use super::metrics::QuantumReading;
use super::types::{AgentStatus, AgentType, Metrics};

#[derive(Debug, Clone)]
pub enum OrchestratorEvent {
    AgentStatusChanged {
        agent_id: String,
        agent_type: AgentType,
        status: AgentStatus,
        message: Option<String>,
        metrics: Option<Metrics>,
    },
    ResponseChunk {
        agent_id: String,
        agent_type: AgentType,
        content: String,
        is_final: bool,
    },
    LatticeChanged(Box<AgentLattice>),
    MetricsReady(QuantumReading),
    AgentFailed {
        agent_type: AgentType,
        error: String,
    },
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, session_id: Uuid, event: OrchestratorEvent);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

#[async_trait]
impl EventSink for NoopEventSink {
    async fn publish(&self, _session_id: Uuid, _event: OrchestratorEvent) {}
}
