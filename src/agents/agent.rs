use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::{json, Value};
use uuid::Uuid;

use super::completion::{CompletionMessage, CompletionRequest, CompletionService};
use super::errors::{AgentError, AgentResult};
use super::profile::{AgentProfile, HistoryPolicy};
use super::prompts::template_for;
use super::types::{
    AgentContext, AgentMemory, AgentResponse, AgentSnapshot, AgentStatus, AgentTrace, AgentType,
    AgentVector, Metrics,
};
use crate::domain::conversation::{Message, MessageRole};

const INITIAL_WEIGHT: f64 = 1.0;
const INITIAL_DECOHERENCE_RESISTANCE: f64 = 0.8;
const TASK_PREVIEW_CHARS: usize = 100;

/// Runtime settings shared by every agent of a session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSettings {
    /// Upper bound for one completion call
    pub call_timeout: Duration,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(120),
        }
    }
}

/// Mutable part of an agent, guarded by a short-lived lock
#[derive(Debug, Clone)]
struct AgentState {
    status: AgentStatus,
    vector: AgentVector,
    memory: AgentMemory,
    traces: Vec<AgentTrace>,
    updated_at: DateTime<Utc>,
}

impl AgentState {
    fn initial(agent_type: AgentType, now: DateTime<Utc>) -> Self {
        Self {
            status: AgentStatus::Idle,
            vector: AgentVector::new(agent_type, INITIAL_WEIGHT, INITIAL_DECOHERENCE_RESISTANCE),
            memory: AgentMemory::default(),
            traces: Vec::new(),
            updated_at: now,
        }
    }
}

/// One role-specialised cell of the lattice.
///
/// Every variant shares this state machine; behaviour differs only through the
/// [`AgentProfile`] and the prompt template of its [`AgentType`].
///
/// The state lock is never held across an `.await`, so lattice readers can take
/// snapshots while a completion call is in flight.
pub struct Agent {
    id: String,
    profile: AgentProfile,
    session_id: Uuid,
    settings: AgentSettings,
    completion: Arc<dyn CompletionService>,
    created_at: DateTime<Utc>,
    state: RwLock<AgentState>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("agent_type", &self.profile.agent_type)
            .field("status", &self.status())
            .finish()
    }
}

impl Agent {
    pub fn new(
        agent_type: AgentType,
        session_id: Uuid,
        completion: Arc<dyn CompletionService>,
        settings: AgentSettings,
    ) -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        let now = Utc::now();
        Self {
            id: format!("{}_{}", agent_type, &simple[..8]),
            profile: AgentProfile::for_type(agent_type),
            session_id,
            settings,
            completion,
            created_at: now,
            state: RwLock::new(AgentState::initial(agent_type, now)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn agent_type(&self) -> AgentType {
        self.profile.agent_type
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn status(&self) -> AgentStatus {
        self.state.read().status
    }

    pub fn vector(&self) -> AgentVector {
        self.state.read().vector.clone()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.state.read().updated_at
    }

    pub fn traces(&self) -> Vec<AgentTrace> {
        self.state.read().traces.clone()
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        let state = self.state.read();
        AgentSnapshot {
            agent_id: self.id.clone(),
            agent_type: self.profile.agent_type,
            status: state.status,
            vector: state.vector.clone(),
            memory: state.memory.clone(),
            traces: state.traces.clone(),
            created_at: self.created_at,
            updated_at: state.updated_at,
        }
    }

    /// Clamped to [0, 1]
    pub fn update_optimization_score(&self, score: f64) {
        let mut state = self.state.write();
        state.vector.set_optimization_score(score);
        state.updated_at = Utc::now();
    }

    pub fn update_memory(
        &self,
        short_term: Vec<String>,
        long_term: Option<serde_json::Map<String, Value>>,
        working_context: Option<String>,
    ) {
        let mut state = self.state.write();
        state.memory.update(short_term, long_term, working_context);
        state.updated_at = Utc::now();
    }

    /// Back to Idle with empty memory, no traces and a zero optimisation score
    pub fn reset(&self) {
        let mut state = self.state.write();
        let weight = state.vector.weight();
        *state = AgentState::initial(self.profile.agent_type, Utc::now());
        state.vector.set_weight(weight);
    }

    fn set_status(&self, status: AgentStatus) {
        let mut state = self.state.write();
        state.status = status;
        state.updated_at = Utc::now();
    }

    fn add_trace(
        &self,
        action: String,
        input_data: Option<Value>,
        output_data: Option<Value>,
        error: Option<String>,
        metrics: Option<Metrics>,
    ) -> AgentTrace {
        let trace = AgentTrace {
            timestamp: Utc::now(),
            agent_id: self.id.clone(),
            agent_type: self.profile.agent_type,
            action,
            input_data,
            output_data,
            error,
            metrics,
        };
        let mut state = self.state.write();
        state.traces.push(trace.clone());
        state.updated_at = trace.timestamp;
        trace
    }

    /// Runs one task through the completion service.
    ///
    /// Transitions Idle/terminal -> Working -> Completed, or -> Error when the
    /// completion call fails or times out. The conversation log is not touched;
    /// appending the response is the caller's job.
    pub async fn process(
        &self,
        task: &str,
        context: &AgentContext,
        history: &[Message],
    ) -> AgentResult<AgentResponse> {
        let started = Instant::now();
        self.set_status(AgentStatus::Working);

        let messages = match self.build_messages(task, context, history) {
            Ok(messages) => messages,
            Err(err) => {
                self.set_status(AgentStatus::Error);
                return Err(err);
            }
        };
        let integrated = context.agent_responses.len();
        let memory_entry = match self.profile.agent_type {
            AgentType::Synthesizer => format!("{}: {} agent outputs", self.profile.memory_verb, integrated),
            _ => format!(
                "{}: {}",
                self.profile.memory_verb,
                task.chars().take(TASK_PREVIEW_CHARS).collect::<String>()
            ),
        };
        self.update_memory(vec![memory_entry], None, Some(task.to_string()));

        let start_input = match self.profile.agent_type {
            AgentType::Synthesizer => json!({ "task": task, "agent_count": integrated }),
            AgentType::Architect => json!({ "task": task, "context": context }),
            _ => json!({ "task": task }),
        };
        self.add_trace(
            format!("start_{}", self.profile.action),
            Some(start_input),
            None,
            None,
            None,
        );

        let request = CompletionRequest {
            system_prompt: template_for(self.profile.agent_type).system.to_string(),
            messages,
            max_tokens: self.profile.max_tokens,
            temperature: self.profile.temperature(context.temperature),
        };

        let text = match self.call_completion(request).await {
            Ok(text) => text,
            Err(err) => {
                self.set_status(AgentStatus::Error);
                self.add_trace(
                    format!("{}_error", self.profile.action),
                    None,
                    None,
                    Some(err.to_string()),
                    None,
                );
                tracing::warn!(
                    agent_id = %self.id,
                    agent_type = %self.profile.agent_type,
                    error = %err,
                    "Agent failed"
                );
                return Err(err);
            }
        };

        let assessment = self.profile.assess(&text, integrated);
        self.update_optimization_score(assessment.confidence);
        if assessment.knowledge.is_some() {
            self.update_memory(Vec::new(), assessment.knowledge.clone(), None);
        }

        let execution_time = started.elapsed().as_secs_f64();
        let mut trace_metrics = Metrics::new();
        trace_metrics.insert("execution_time".to_string(), execution_time);
        trace_metrics.insert("w2_score".to_string(), assessment.confidence);
        let trace = self.add_trace(
            format!("complete_{}", self.profile.action),
            None,
            Some(assessment.output),
            None,
            Some(trace_metrics),
        );

        self.set_status(AgentStatus::Completed);

        let mut metrics = assessment.metrics;
        metrics.insert("execution_time".to_string(), execution_time);

        Ok(AgentResponse {
            agent_id: self.id.clone(),
            agent_type: self.profile.agent_type,
            response: text,
            confidence: assessment.confidence,
            metrics: Some(metrics),
            trace: Some(trace),
        })
    }

    async fn call_completion(&self, request: CompletionRequest) -> AgentResult<String> {
        let agent_type = self.profile.agent_type;
        let timeout = self.settings.call_timeout;
        let input = json!({ "messages": request.messages.len(), "max_tokens": request.max_tokens });

        match tokio::time::timeout(timeout, self.completion.complete(request)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(source)) => {
                self.add_trace(
                    "call_completion".to_string(),
                    Some(input),
                    None,
                    Some(source.to_string()),
                    None,
                );
                Err(AgentError::Completion { agent_type, source })
            }
            Err(_) => {
                self.add_trace(
                    "call_completion".to_string(),
                    Some(input),
                    None,
                    Some(format!("timed out after {timeout:?}")),
                    None,
                );
                Err(AgentError::Timeout {
                    agent_type,
                    elapsed: timeout,
                })
            }
        }
    }

    fn build_messages(
        &self,
        task: &str,
        context: &AgentContext,
        history: &[Message],
    ) -> AgentResult<Vec<CompletionMessage>> {
        let mut messages = Vec::new();

        match self.profile.history {
            HistoryPolicy::Recent(n) => {
                let skip = history.len().saturating_sub(n);
                messages.extend(history[skip..].iter().map(to_completion_message));
            }
            HistoryPolicy::LastUserMessage => {
                if let Some(last_user) = history.iter().rev().find(|m| m.role == MessageRole::User) {
                    messages.push(CompletionMessage::user(format!(
                        "Original request: {}",
                        last_user.content
                    )));
                }
            }
        }

        let mut variables = HashMap::from([
            ("task", task.to_string()),
            ("context", context_json(context)?),
        ]);
        if self.profile.agent_type == AgentType::Synthesizer {
            let outputs = context
                .agent_responses
                .iter()
                .map(|r| format!("**{} Agent:**\n{}", r.agent_type.as_str().to_uppercase(), r.response))
                .collect::<Vec<_>>()
                .join("\n\n");
            variables.insert("outputs", outputs);
        }

        messages.push(CompletionMessage::user(
            template_for(self.profile.agent_type).render(&variables),
        ));
        Ok(messages)
    }
}

/// Context rendered for the prompt; the Synthesizer gets its outputs separately
fn context_json(context: &AgentContext) -> AgentResult<String> {
    let mut value = serde_json::to_value(context)?;
    if let Value::Object(map) = &mut value {
        map.remove("agent_responses");
    }
    Ok(serde_json::to_string_pretty(&value)?)
}

fn to_completion_message(message: &Message) -> CompletionMessage {
    match message.role {
        MessageRole::User | MessageRole::System => CompletionMessage::user(message.content.clone()),
        MessageRole::Assistant | MessageRole::Agent => {
            CompletionMessage::assistant(message.content.clone())
        }
    }
}
