// Real-time broadcast layer
//
// Websocket connections are grouped per session; orchestrator progress is
// fanned out to them through the `EventSink` implementation of the manager.

pub mod dispatch;
pub mod events;
pub mod manager;

pub use dispatch::{dispatch, Disposition};
pub use events::{EventPayload, InboundFrame, OutboundEvent};
pub use manager::ConnectionManager;
