// Text-completion port
//
// Agents only see this trait; the HTTP adapter lives in infrastructure::llm.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by a completion provider
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("malformed provider response: {0}")]
    Decode(String),
}

/// Roles accepted by the completion provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionMessage {
    pub role: CompletionRole,
    pub content: String,
}

impl CompletionMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: CompletionRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: CompletionRole::Assistant,
            content: content.into(),
        }
    }
}

/// One call to the completion service
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub messages: Vec<CompletionMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}

type Responder = dyn Fn(&CompletionRequest) -> Result<String, CompletionError> + Send + Sync;

/// In-process completion service driven by a closure.
///
/// Used by the test suites and for running the service without provider credentials.
pub struct ScriptedCompletion {
    responder: Arc<Responder>,
    calls: AtomicUsize,
}

impl ScriptedCompletion {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<String, CompletionError> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always answers with the same text
    pub fn fixed(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_| Ok(text.clone()))
    }

    /// Echoes the last message back, prefixed with the first line of the system prompt
    pub fn echo() -> Self {
        Self::new(|request| {
            let role = request.system_prompt.lines().next().unwrap_or_default();
            let last = request
                .messages
                .last()
                .map(|m| m.content.as_str())
                .unwrap_or_default();
            Ok(format!("{role}\n\n{last}"))
        })
    }

    /// Number of completed `complete` calls
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.responder)(&request)
    }
}
