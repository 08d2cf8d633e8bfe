// Read-only projection of the agent set for visualisation
//
// Recomputed on every call from the live agents; never cached or persisted.
// Each agent is read under its own short lock, so a snapshot taken during a
// request may mix pre- and post-update agents.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::agent::Agent;
use super::types::{AgentStatus, AgentType, AgentVector};

/// Fixed 3-D coordinates of a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Node of the lattice
#[derive(Debug, Clone, Serialize)]
pub struct AgentNode {
    pub agent_id: String,
    pub agent_type: AgentType,
    pub status: AgentStatus,
    pub vector: AgentVector,
    pub position: Position,
    pub connections: Vec<String>,
    pub last_activity: DateTime<Utc>,
}

/// Snapshot of a session's agent lattice
#[derive(Debug, Clone, Serialize)]
pub struct AgentLattice {
    pub session_id: Uuid,
    pub nodes: Vec<AgentNode>,
    pub active_agents: usize,
    pub total_interactions: u64,
    pub lattice_coherence: f64,
    pub timestamp: DateTime<Utc>,
}

/// Static hexagonal layout keyed by agent type
pub fn position_of(agent_type: AgentType) -> Position {
    let (x, y) = match agent_type {
        AgentType::Architect => (0.5, 0.0),
        AgentType::Engineer => (0.0, 0.5),
        AgentType::Reviewer => (1.0, 0.5),
        AgentType::Debugger => (0.0, 1.0),
        AgentType::Research => (1.0, 1.0),
        AgentType::Synthesizer => (0.5, 1.5),
    };
    Position { x, y, z: 0.0 }
}

/// Static adjacency keyed by agent type
pub fn neighbours_of(agent_type: AgentType) -> &'static [AgentType] {
    use AgentType::*;
    match agent_type {
        Architect => &[Engineer, Research, Synthesizer],
        Engineer => &[Architect, Reviewer, Debugger],
        Reviewer => &[Engineer, Synthesizer],
        Debugger => &[Engineer, Research],
        Research => &[Architect, Debugger, Synthesizer],
        Synthesizer => &[Architect, Reviewer, Research],
    }
}

impl AgentLattice {
    /// Projects the current agent states into a lattice snapshot
    pub fn project(session_id: Uuid, agents: &[Agent], total_interactions: u64) -> Self {
        let id_of = |agent_type: AgentType| {
            agents
                .iter()
                .find(|a| a.agent_type() == agent_type)
                .map(|a| a.id().to_string())
        };

        let nodes: Vec<AgentNode> = agents
            .iter()
            .map(|agent| {
                let snapshot = agent.snapshot();
                AgentNode {
                    agent_id: snapshot.agent_id,
                    agent_type: snapshot.agent_type,
                    status: snapshot.status,
                    vector: snapshot.vector,
                    position: position_of(snapshot.agent_type),
                    connections: neighbours_of(snapshot.agent_type)
                        .iter()
                        .filter_map(|t| id_of(*t))
                        .collect(),
                    last_activity: snapshot.updated_at,
                }
            })
            .collect();

        let active_agents = nodes.iter().filter(|n| n.status.is_busy()).count();
        let lattice_coherence = if nodes.is_empty() {
            0.0
        } else {
            nodes.iter().map(|n| n.vector.optimization_score()).sum::<f64>() / nodes.len() as f64
        };

        Self {
            session_id,
            nodes,
            active_agents,
            total_interactions,
            lattice_coherence,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacency_is_symmetric() {
        for agent_type in AgentType::ALL {
            for peer in neighbours_of(agent_type) {
                assert!(
                    neighbours_of(*peer).contains(&agent_type),
                    "{agent_type} -> {peer} has no back edge"
                );
            }
        }
    }

    #[test]
    fn positions_are_distinct() {
        for (i, a) in AgentType::ALL.iter().enumerate() {
            for b in &AgentType::ALL[i + 1..] {
                assert_ne!(position_of(*a), position_of(*b));
            }
        }
    }
}
