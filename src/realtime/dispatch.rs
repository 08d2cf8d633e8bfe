use uuid::Uuid;

use super::events::{EventPayload, InboundFrame};
use super::manager::ConnectionManager;
use crate::agents::lattice::AgentLattice;

/// What the socket loop should do after handling a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Continue,
    Close,
}

/// Handles one inbound text frame.
///
/// Replies go to the requesting connection only. A frame that is not valid
/// JSON is unrecoverable: the session gets an error event and the caller is
/// told to close.
pub async fn dispatch<F>(
    manager: &ConnectionManager,
    session_id: Uuid,
    connection_id: Uuid,
    raw: &str,
    lattice: F,
) -> Disposition
where
    F: FnOnce() -> Option<AgentLattice>,
{
    let frame = match serde_json::from_str::<InboundFrame>(raw) {
        Ok(frame) => frame,
        Err(err) => {
            tracing::warn!(%session_id, %connection_id, error = %err, "Malformed websocket frame");
            manager
                .send_error(session_id, format!("Invalid message: {err}"), None)
                .await;
            return Disposition::Close;
        }
    };

    match frame {
        InboundFrame::Ping => {
            manager
                .send_to_connection(session_id, connection_id, EventPayload::Pong)
                .await;
        }
        InboundFrame::SubscribeLattice => {
            if let Some(lattice) = lattice() {
                manager
                    .send_to_connection(
                        session_id,
                        connection_id,
                        EventPayload::LatticeUpdate {
                            lattice: Box::new(lattice),
                        },
                    )
                    .await;
            }
        }
        InboundFrame::GetStatus => {
            let connections = manager.connection_count(Some(session_id)).await;
            manager
                .send_to_connection(session_id, connection_id, EventPayload::Status { connections })
                .await;
        }
        InboundFrame::UnsubscribeLattice => {}
        InboundFrame::Unknown => {
            tracing::debug!(%session_id, %connection_id, "Ignoring unknown frame type");
        }
    }

    Disposition::Continue
}
