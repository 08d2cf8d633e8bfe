// Agent system modules
//
// Six role-specialised agents coordinated per session by an orchestrator.
// External services (LLM provider, quantum gateway, event delivery) are
// reached through the ports defined in `completion`, `metrics` and `events`.

pub mod agent;
pub mod completion;
pub mod errors;
pub mod events;
pub mod lattice;
pub mod metrics;
pub mod orchestrator;
pub mod plan;
pub mod profile;
pub mod prompts;
pub mod request;
pub mod store;
pub mod types;
pub mod workflow;

// Re-export main types
pub use agent::{Agent, AgentSettings};
pub use errors::AgentError;
pub use orchestrator::{Orchestrator, OrchestratorDeps};
pub use request::{AuraRequest, AuraResponse};
pub use store::{InMemoryOrchestratorStore, OrchestratorStore};
pub use types::{AgentStatus, AgentType};
