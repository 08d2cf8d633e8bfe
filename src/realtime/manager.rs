use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use super::events::{EventPayload, OutboundEvent};
use crate::agents::events::{EventSink, OrchestratorEvent};
use crate::agents::lattice::AgentLattice;
use crate::agents::metrics::QuantumReading;
use crate::agents::types::{AgentStatus, AgentType, Metrics};

type Outbox = mpsc::UnboundedSender<OutboundEvent>;

/// Live websocket connections grouped by session.
///
/// Each connection owns an unbounded outbox drained by its socket writer, so a
/// slow client never stalls delivery to the others. A send fails only when the
/// writer is gone; such connections are dropped from the registry.
#[derive(Default)]
pub struct ConnectionManager {
    sessions: RwLock<HashMap<Uuid, HashMap<Uuid, Outbox>>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection and greets it with a `connected` frame
    pub async fn connect(&self, session_id: Uuid) -> (Uuid, mpsc::UnboundedReceiver<OutboundEvent>) {
        let connection_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();

        let _ = tx.send(OutboundEvent::new(
            session_id,
            EventPayload::Connected {
                connection_id,
                message: "Connected to AURA lattice".to_string(),
            },
        ));

        self.sessions
            .write()
            .await
            .entry(session_id)
            .or_default()
            .insert(connection_id, tx);

        tracing::info!(%session_id, %connection_id, "Connection added");
        (connection_id, rx)
    }

    /// Removes a connection; the session entry goes away with its last connection
    pub async fn disconnect(&self, session_id: Uuid, connection_id: Uuid) {
        let mut sessions = self.sessions.write().await;
        if let Some(connections) = sessions.get_mut(&session_id) {
            if connections.remove(&connection_id).is_some() {
                tracing::info!(%session_id, %connection_id, "Connection removed");
            }
            if connections.is_empty() {
                sessions.remove(&session_id);
            }
        }
    }

    /// Best-effort fan-out to every connection of a session.
    ///
    /// Sends to a snapshot of the connection set, so connects and disconnects
    /// during delivery are safe. A connection whose channel is closed is
    /// deregistered; delivery to the others continues.
    ///
    /// # Arguments
    /// * `session_id` - Session whose subscribers receive the event
    /// * `payload` - Event body; `session_id` and `timestamp` are added here
    ///
    /// # Returns
    /// Number of connections the event was handed to (0 for an unknown session)
    ///
    /// # Example
    /// ```
    /// use aura_api::realtime::{ConnectionManager, EventPayload};
    /// use uuid::Uuid;
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let manager = ConnectionManager::new();
    /// let session_id = Uuid::new_v4();
    /// let (_connection_id, _outbox) = manager.connect(session_id).await;
    ///
    /// assert_eq!(manager.broadcast_to_session(session_id, EventPayload::Pong).await, 1);
    /// assert_eq!(manager.broadcast_to_session(Uuid::new_v4(), EventPayload::Pong).await, 0);
    /// # });
    /// ```
    pub async fn broadcast_to_session(&self, session_id: Uuid, payload: EventPayload) -> usize {
        let snapshot: Vec<(Uuid, Outbox)> = match self.sessions.read().await.get(&session_id) {
            Some(connections) => connections.iter().map(|(id, tx)| (*id, tx.clone())).collect(),
            None => return 0,
        };

        let event = OutboundEvent::new(session_id, payload);
        let mut delivered = 0;
        let mut broken = Vec::new();
        for (connection_id, tx) in snapshot {
            if tx.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                broken.push(connection_id);
            }
        }

        for connection_id in broken {
            tracing::warn!(%session_id, %connection_id, event = event.kind(), "Dropping broken connection");
            self.disconnect(session_id, connection_id).await;
        }

        delivered
    }

    /// Sends to one connection only; false when it is unknown or broken
    pub async fn send_to_connection(&self, session_id: Uuid, connection_id: Uuid, payload: EventPayload) -> bool {
        let tx = self
            .sessions
            .read()
            .await
            .get(&session_id)
            .and_then(|connections| connections.get(&connection_id))
            .cloned();

        let Some(tx) = tx else {
            return false;
        };
        if tx.send(OutboundEvent::new(session_id, payload)).is_ok() {
            return true;
        }
        self.disconnect(session_id, connection_id).await;
        false
    }

    pub async fn send_agent_update(
        &self,
        session_id: Uuid,
        agent_id: String,
        agent_type: AgentType,
        status: AgentStatus,
        message: Option<String>,
        metrics: Option<Metrics>,
    ) -> usize {
        self.broadcast_to_session(
            session_id,
            EventPayload::AgentUpdate {
                agent_id,
                agent_type,
                status,
                message,
                metrics,
            },
        )
        .await
    }

    pub async fn send_lattice_update(&self, session_id: Uuid, lattice: AgentLattice) -> usize {
        self.broadcast_to_session(
            session_id,
            EventPayload::LatticeUpdate {
                lattice: Box::new(lattice),
            },
        )
        .await
    }

    pub async fn send_response_chunk(
        &self,
        session_id: Uuid,
        agent_id: String,
        agent_type: AgentType,
        content: String,
        is_final: bool,
    ) -> usize {
        self.broadcast_to_session(
            session_id,
            EventPayload::ResponseChunk {
                agent_id,
                agent_type,
                content,
                is_final,
            },
        )
        .await
    }

    pub async fn send_quantum_metrics(&self, session_id: Uuid, reading: QuantumReading) -> usize {
        self.broadcast_to_session(
            session_id,
            EventPayload::QuantumMetrics {
                metrics: reading.metrics,
                backend: reading.backend,
            },
        )
        .await
    }

    pub async fn send_error(&self, session_id: Uuid, error: String, agent_type: Option<AgentType>) -> usize {
        self.broadcast_to_session(session_id, EventPayload::Error { error, agent_type })
            .await
    }

    /// Connections of one session, or of all sessions when `None`
    pub async fn connection_count(&self, session_id: Option<Uuid>) -> usize {
        let sessions = self.sessions.read().await;
        match session_id {
            Some(id) => sessions.get(&id).map_or(0, HashMap::len),
            None => sessions.values().map(HashMap::len).sum(),
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl EventSink for ConnectionManager {
    async fn publish(&self, session_id: Uuid, event: OrchestratorEvent) {
        match event {
            OrchestratorEvent::AgentStatusChanged {
                agent_id,
                agent_type,
                status,
                message,
                metrics,
            } => {
                self.send_agent_update(session_id, agent_id, agent_type, status, message, metrics)
                    .await;
            }
            OrchestratorEvent::ResponseChunk {
                agent_id,
                agent_type,
                content,
                is_final,
            } => {
                self.send_response_chunk(session_id, agent_id, agent_type, content, is_final)
                    .await;
            }
            OrchestratorEvent::LatticeChanged(lattice) => {
                self.send_lattice_update(session_id, *lattice).await;
            }
            OrchestratorEvent::MetricsReady(reading) => {
                self.send_quantum_metrics(session_id, reading).await;
            }
            OrchestratorEvent::AgentFailed { agent_type, error } => {
                self.send_error(session_id, error, Some(agent_type)).await;
            }
        }
    }
}
