use std::time::Duration;

use thiserror::Error;

use super::completion::CompletionError;
use super::types::AgentType;

/// Errors that can occur in the agent system
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("{agent_type} agent completion failed: {source}")]
    Completion {
        agent_type: AgentType,
        #[source]
        source: CompletionError,
    },

    #[error("{agent_type} agent timed out after {elapsed:?}")]
    Timeout {
        agent_type: AgentType,
        elapsed: Duration,
    },

    #[error("Synthesis failed: {0}")]
    SynthesisFailed(Box<AgentError>),

    #[error("Session {0} has ended")]
    SessionClosed(uuid::Uuid),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AgentError {
    /// Agent variant the failure originated from, when it is agent-specific
    pub fn agent_type(&self) -> Option<AgentType> {
        match self {
            AgentError::Completion { agent_type, .. } | AgentError::Timeout { agent_type, .. } => {
                Some(*agent_type)
            }
            AgentError::SynthesisFailed(inner) => inner.agent_type(),
            _ => None,
        }
    }
}

pub type AgentResult<T> = Result<T, AgentError>;
