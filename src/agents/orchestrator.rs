use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::agent::{Agent, AgentSettings};
use super::completion::CompletionService;
use super::errors::{AgentError, AgentResult};
use super::events::{EventSink, OrchestratorEvent};
use super::lattice::AgentLattice;
use super::metrics::{MetricsService, QuantumReading};
use super::request::{AuraRequest, AuraResponse};
use super::types::{
    AgentContext, AgentResponse, AgentSnapshot, AgentStatus, AgentTrace, AgentType, Metrics,
    ResponseDigest,
};
use super::workflow::{should_continue, Workflow};
use crate::domain::conversation::{ConversationLog, Message};

/// Number of earlier responses handed to each agent as context
const PREVIOUS_RESPONSES: usize = 3;
const SYNTHESIS_TASK: &str = "Synthesize all agent outputs into final response";

/// Collaborators shared by every orchestrator of a process
#[derive(Clone)]
pub struct OrchestratorDeps {
    pub completion: Arc<dyn CompletionService>,
    pub metrics: Arc<dyn MetricsService>,
    pub events: Arc<dyn EventSink>,
    pub settings: AgentSettings,
}

/// Per-session coordinator of the six agents.
///
/// Requests for one session are serialised by an internal run lock. Lattice
/// reads and conversation snapshots never take that lock, so they stay
/// available while a request is in flight.
pub struct Orchestrator {
    session_id: Uuid,
    user_id: Option<Uuid>,
    /// One agent per variant, in `AgentType::ALL` order
    agents: Vec<Agent>,
    conversation: RwLock<ConversationLog>,
    total_iterations: AtomicU64,
    run_lock: Mutex<()>,
    /// Set once the session has ended; no further requests are accepted
    closed: AtomicBool,
    metrics: Arc<dyn MetricsService>,
    events: Arc<dyn EventSink>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("session_id", &self.session_id)
            .field("user_id", &self.user_id)
            .field("messages", &self.conversation.read().len())
            .field("total_iterations", &self.total_iterations())
            .finish()
    }
}

impl Orchestrator {
    pub fn new(session_id: Uuid, user_id: Option<Uuid>, deps: OrchestratorDeps) -> Self {
        Self::with_history(session_id, user_id, deps, Vec::new())
    }

    /// Orchestrator whose conversation starts from persisted history
    pub fn with_history(
        session_id: Uuid,
        user_id: Option<Uuid>,
        deps: OrchestratorDeps,
        history: Vec<Message>,
    ) -> Self {
        let agents = AgentType::ALL
            .iter()
            .map(|agent_type| Agent::new(*agent_type, session_id, deps.completion.clone(), deps.settings))
            .collect();

        Self {
            session_id,
            user_id,
            agents,
            conversation: RwLock::new(ConversationLog::seeded(history)),
            total_iterations: AtomicU64::new(0),
            run_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
            metrics: deps.metrics,
            events: deps.events,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    pub fn total_iterations(&self) -> u64 {
        self.total_iterations.load(Ordering::SeqCst)
    }

    pub fn agent(&self, agent_type: AgentType) -> &Agent {
        &self.agents[agent_type as usize]
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent_snapshots(&self) -> Vec<AgentSnapshot> {
        self.agents.iter().map(Agent::snapshot).collect()
    }

    /// Copy of the conversation, oldest first
    pub fn conversation(&self) -> Vec<Message> {
        self.conversation.read().messages().to_vec()
    }

    /// Current lattice projection; safe to call during a request
    pub fn lattice(&self) -> AgentLattice {
        AgentLattice::project(self.session_id, &self.agents, self.total_iterations())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Refuses every later request.
    ///
    /// Waits for an in-flight request to finish, so once this returns the
    /// conversation no longer changes.
    pub async fn close(&self) {
        let _guard = self.run_lock.lock().await;
        self.closed.store(true, Ordering::SeqCst);
        debug!(session_id = %self.session_id, "Orchestrator closed");
    }

    /// Clears the conversation, zeroes the iteration counter and resets every agent.
    ///
    /// Waits for any in-flight request of this session to finish first.
    pub async fn reset(&self) {
        let _guard = self.run_lock.lock().await;
        self.conversation.write().clear();
        self.total_iterations.store(0, Ordering::SeqCst);
        for agent in &self.agents {
            agent.reset();
        }
        info!(session_id = %self.session_id, "Session reset");
        self.publish_lattice().await;
    }

    /// Runs one request through the workflow loop and synthesis.
    ///
    /// Individual agent failures are skipped; only a synthesis failure, an
    /// invalid request or a closed session fails the whole call.
    ///
    /// # Arguments
    /// * `request` - Prompt plus loop settings; validated before anything runs
    ///
    /// # Returns
    /// * `Ok(AuraResponse)` - Synthesised answer with every agent response in execution order
    /// * `Err(AgentError::InvalidRequest)` - Empty prompt or out-of-range settings
    /// * `Err(AgentError::SessionClosed)` - The session ended before the request started
    /// * `Err(AgentError::SynthesisFailed)` - The Synthesizer could not produce an answer
    ///
    /// # Example
    /// ```no_run
    /// # async fn run(orchestrator: &aura_api::agents::Orchestrator) {
    /// use aura_api::agents::AuraRequest;
    ///
    /// let mut request = AuraRequest::new("what is a qubit");
    /// request.max_iterations = 2;
    /// let response = orchestrator.process_request(&request).await.unwrap();
    /// println!("{}", response.final_response);
    /// # }
    /// ```
    pub async fn process_request(&self, request: &AuraRequest) -> AgentResult<AuraResponse> {
        request.validate()?;
        let _guard = self.run_lock.lock().await;
        if self.is_closed() {
            return Err(AgentError::SessionClosed(self.session_id));
        }
        let started = Instant::now();

        self.append(Message::user(request.prompt.clone()));

        let workflow = Workflow::classify(&request.prompt);
        info!(
            session_id = %self.session_id,
            workflow = ?workflow,
            max_iterations = request.max_iterations,
            "Processing request"
        );

        let mut responses: Vec<AgentResponse> = Vec::new();
        for iteration in 0..request.max_iterations {
            self.total_iterations.fetch_add(1, Ordering::SeqCst);

            for agent_type in workflow.agents() {
                if !request.is_enabled(*agent_type) {
                    continue;
                }
                let context = self.step_context(request, &responses);
                if let Some(response) = self.run_agent(*agent_type, &request.prompt, &context, request.stream).await {
                    responses.push(response);
                }
            }

            self.publish_lattice().await;

            if !should_continue(&responses, iteration, request.max_iterations) {
                debug!(session_id = %self.session_id, iteration, "Iteration loop finished");
                break;
            }
        }

        let synthesis = self.synthesize(request, &responses).await?;
        let final_response = synthesis.response.clone();
        responses.push(synthesis);

        let reading = if request.quantum_enhanced {
            self.fetch_metrics(request.quantum_backend.as_deref()).await
        } else {
            None
        };

        let traces = request.include_traces.then(|| self.collect_traces());
        let execution_time_ms = started.elapsed().as_millis() as u64;
        let agents_involved: Vec<&str> = responses.iter().map(|r| r.agent_type.as_str()).collect();

        let mut assistant = Message::assistant(final_response.clone())
            .with_metadata("execution_time_ms", Value::from(execution_time_ms))
            .with_metadata("agents_involved", json!(agents_involved));
        if let Some(reading) = &reading {
            assistant = assistant.with_metadata("consciousness_metrics", json!(reading.metrics));
        }
        self.append(assistant);

        info!(
            session_id = %self.session_id,
            responses = responses.len(),
            execution_time_ms,
            "Request complete"
        );

        Ok(AuraResponse {
            session_id: self.session_id,
            workflow,
            final_response,
            agent_responses: responses,
            total_iterations: self.total_iterations(),
            execution_time_ms,
            consciousness_metrics: reading.as_ref().map(|r| r.metrics),
            quantum_backend_used: reading.map(|r| r.backend),
            traces,
        })
    }

    fn append(&self, message: Message) {
        self.conversation.write().append(message);
    }

    fn step_context(&self, request: &AuraRequest, responses: &[AgentResponse]) -> AgentContext {
        let mut context = AgentContext::new(self.session_id, request.prompt.clone(), request.temperature);
        let skip = responses.len().saturating_sub(PREVIOUS_RESPONSES);
        context.previous_responses = responses[skip..].iter().map(ResponseDigest::from).collect();
        context
    }

    /// Runs one agent; `None` when it failed
    async fn run_agent(
        &self,
        agent_type: AgentType,
        task: &str,
        context: &AgentContext,
        stream: bool,
    ) -> Option<AgentResponse> {
        let agent = self.agent(agent_type);
        self.publish_status(agent, AgentStatus::Working, None, None).await;

        let history = self.conversation();
        match agent.process(task, context, &history).await {
            Ok(response) => {
                self.append(
                    Message::agent(response.response.clone(), response.agent_id.clone(), agent_type)
                        .with_metadata("confidence", Value::from(response.confidence))
                        .with_metadata("metrics", json!(response.metrics)),
                );
                self.publish_status(agent, AgentStatus::Completed, None, response.metrics.clone())
                    .await;
                if stream {
                    self.events
                        .publish(
                            self.session_id,
                            OrchestratorEvent::ResponseChunk {
                                agent_id: response.agent_id.clone(),
                                agent_type,
                                content: response.response.clone(),
                                is_final: false,
                            },
                        )
                        .await;
                }
                Some(response)
            }
            Err(err) => {
                warn!(
                    session_id = %self.session_id,
                    agent_type = %agent_type,
                    error = %err,
                    "Skipping failed agent"
                );
                self.publish_status(agent, AgentStatus::Error, Some(err.to_string()), None).await;
                self.events
                    .publish(
                        self.session_id,
                        OrchestratorEvent::AgentFailed {
                            agent_type,
                            error: err.to_string(),
                        },
                    )
                    .await;
                None
            }
        }
    }

    async fn synthesize(&self, request: &AuraRequest, responses: &[AgentResponse]) -> AgentResult<AgentResponse> {
        let synthesizer = self.agent(AgentType::Synthesizer);
        let mut context = AgentContext::new(self.session_id, request.prompt.clone(), request.temperature);
        context.agent_responses = responses.iter().map(ResponseDigest::from).collect();

        self.publish_status(synthesizer, AgentStatus::Working, None, None).await;
        let history = self.conversation();

        match synthesizer.process(SYNTHESIS_TASK, &context, &history).await {
            Ok(synthesis) => {
                self.publish_status(synthesizer, AgentStatus::Completed, None, synthesis.metrics.clone())
                    .await;
                if request.stream {
                    self.events
                        .publish(
                            self.session_id,
                            OrchestratorEvent::ResponseChunk {
                                agent_id: synthesis.agent_id.clone(),
                                agent_type: AgentType::Synthesizer,
                                content: synthesis.response.clone(),
                                is_final: true,
                            },
                        )
                        .await;
                }
                self.publish_lattice().await;
                Ok(synthesis)
            }
            Err(err) => {
                self.publish_status(synthesizer, AgentStatus::Error, Some(err.to_string()), None)
                    .await;
                self.publish_lattice().await;
                Err(AgentError::SynthesisFailed(Box::new(err)))
            }
        }
    }

    async fn fetch_metrics(&self, backend_hint: Option<&str>) -> Option<QuantumReading> {
        match self.metrics.compute_metrics(backend_hint).await {
            Ok(Some(reading)) => {
                self.events
                    .publish(self.session_id, OrchestratorEvent::MetricsReady(reading.clone()))
                    .await;
                Some(reading)
            }
            Ok(None) => None,
            Err(err) => {
                warn!(session_id = %self.session_id, error = %err, "Quantum metrics unavailable");
                None
            }
        }
    }

    fn collect_traces(&self) -> Vec<AgentTrace> {
        self.agents.iter().flat_map(|a| a.traces()).collect()
    }

    async fn publish_status(
        &self,
        agent: &Agent,
        status: AgentStatus,
        message: Option<String>,
        metrics: Option<Metrics>,
    ) {
        self.events
            .publish(
                self.session_id,
                OrchestratorEvent::AgentStatusChanged {
                    agent_id: agent.id().to_string(),
                    agent_type: agent.agent_type(),
                    status,
                    message,
                    metrics,
                },
            )
            .await;
    }

    async fn publish_lattice(&self) {
        self.events
            .publish(self.session_id, OrchestratorEvent::LatticeChanged(Box::new(self.lattice())))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::completion::{CompletionError, ScriptedCompletion};
    use crate::agents::events::NoopEventSink;
    use crate::agents::metrics::{DisabledMetricsService, MetricsError};
    use crate::agents::types::QuantumMetrics;
    use crate::domain::conversation::MessageRole;

    fn deps(completion: Arc<dyn CompletionService>) -> OrchestratorDeps {
        OrchestratorDeps {
            completion,
            metrics: Arc::new(DisabledMetricsService),
            events: Arc::new(NoopEventSink),
            settings: AgentSettings::default(),
        }
    }

    fn orchestrator(completion: Arc<dyn CompletionService>) -> Orchestrator {
        Orchestrator::new(Uuid::new_v4(), None, deps(completion))
    }

    #[tokio::test]
    async fn low_confidence_runs_every_iteration() {
        // "needs work" keeps the reviewer at 0.5 so the loop never stops early
        let completion = Arc::new(ScriptedCompletion::fixed("needs work"));
        let orch = orchestrator(completion.clone());
        let mut request = AuraRequest::new("build a todo app");
        request.max_iterations = 2;

        let response = orch.process_request(&request).await.unwrap();

        // 2 iterations x (architect, engineer, reviewer) + synthesis
        assert_eq!(completion.calls(), 7);
        assert_eq!(response.agent_responses.len(), 7);
        assert_eq!(response.total_iterations, 2);
        assert_eq!(response.workflow, Workflow::Implementation);
    }

    #[tokio::test]
    async fn only_the_last_response_decides_stopping() {
        // reviewer approves (0.9) but the engineer after it scores 0.7
        let completion = Arc::new(ScriptedCompletion::fixed("LGTM, approve"));
        let orch = orchestrator(completion.clone());

        let response = orch
            .process_request(&AuraRequest::new("review my parser"))
            .await
            .unwrap();

        assert_eq!(response.workflow, Workflow::Review);
        assert_eq!(completion.calls(), 5 * 2 + 1);
        assert_eq!(response.total_iterations, 5);
    }

    #[tokio::test]
    async fn stops_when_last_response_is_confident() {
        // Research workflow ends with the architect; a "low" complexity plan scores 0.9
        let completion = Arc::new(ScriptedCompletion::fixed(
            r#"{"analysis": "a", "steps": ["x"], "estimated_complexity": "low"}"#,
        ));
        let orch = orchestrator(completion.clone());
        let mut request = AuraRequest::new("explain the borrow checker");
        request.max_iterations = 5;

        let response = orch.process_request(&request).await.unwrap();

        assert_eq!(response.workflow, Workflow::Research);
        // research, architect, synthesis
        assert_eq!(completion.calls(), 3);
        assert_eq!(response.total_iterations, 1);
    }

    #[tokio::test]
    async fn failed_agents_are_skipped_and_synthesis_still_runs() {
        let completion = Arc::new(ScriptedCompletion::new(|request| {
            if request.temperature == 0.5 {
                Ok("final answer".to_string())
            } else {
                Err(CompletionError::Transport("down".into()))
            }
        }));
        let orch = orchestrator(completion.clone());
        let mut request = AuraRequest::new("build it");
        request.max_iterations = 1;

        let response = orch.process_request(&request).await.unwrap();

        assert_eq!(response.final_response, "final answer");
        assert_eq!(response.agent_responses.len(), 1);
        assert_eq!(orch.agent(AgentType::Architect).status(), AgentStatus::Error);
        assert_eq!(orch.agent(AgentType::Synthesizer).status(), AgentStatus::Completed);
    }

    #[tokio::test]
    async fn synthesis_failure_fails_the_request() {
        let completion = Arc::new(ScriptedCompletion::new(|_| {
            Err(CompletionError::Provider {
                status: 529,
                body: "overloaded".into(),
            })
        }));
        let orch = orchestrator(completion);
        let mut request = AuraRequest::new("build it");
        request.max_iterations = 1;

        let err = orch.process_request(&request).await.unwrap_err();
        assert!(matches!(err, AgentError::SynthesisFailed(_)));
    }

    #[tokio::test]
    async fn conversation_records_user_agents_then_assistant() {
        let orch = orchestrator(Arc::new(ScriptedCompletion::fixed("needs work")));
        let mut request = AuraRequest::new("build a cli");
        request.max_iterations = 1;
        request.agents_enabled = vec![AgentType::Engineer, AgentType::Synthesizer];

        orch.process_request(&request).await.unwrap();

        let roles: Vec<MessageRole> = orch.conversation().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![MessageRole::User, MessageRole::Agent, MessageRole::Assistant]);
        let log = orch.conversation();
        assert_eq!(log[1].agent_type, Some(AgentType::Engineer));
        assert!(log[2].metadata.contains_key("execution_time_ms"));
    }

    #[tokio::test]
    async fn iterations_accumulate_across_requests_until_reset() {
        let orch = orchestrator(Arc::new(ScriptedCompletion::fixed("needs work")));
        let mut request = AuraRequest::new("build a cli");
        request.max_iterations = 2;

        orch.process_request(&request).await.unwrap();
        let second = orch.process_request(&request).await.unwrap();
        assert_eq!(second.total_iterations, 4);

        orch.reset().await;
        assert_eq!(orch.total_iterations(), 0);
        assert!(orch.conversation().is_empty());
        assert!(orch.agents().iter().all(|a| a.status() == AgentStatus::Idle));
    }

    #[tokio::test]
    async fn closed_orchestrator_refuses_requests() {
        let completion = Arc::new(ScriptedCompletion::fixed("needs work"));
        let orch = orchestrator(completion.clone());

        orch.close().await;
        let err = orch
            .process_request(&AuraRequest::new("build a cache"))
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::SessionClosed(id) if id == orch.session_id()));
        assert!(orch.is_closed());
        assert_eq!(completion.calls(), 0);
        assert!(orch.conversation().is_empty());
    }

    #[tokio::test]
    async fn close_waits_for_the_running_request() {
        let completion = Arc::new(ScriptedCompletion::fixed("needs work"));
        let orch = Arc::new(orchestrator(completion));
        let mut request = AuraRequest::new("build a cache");
        request.max_iterations = 2;

        let running = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.process_request(&request).await })
        };
        tokio::task::yield_now().await;
        orch.close().await;

        // whichever won the run lock, the log is either complete or untouched
        let len = orch.conversation().len();
        match running.await.unwrap() {
            Ok(_) => assert_eq!(len, 8),
            Err(err) => {
                assert!(matches!(err, AgentError::SessionClosed(_)));
                assert_eq!(len, 0);
            }
        }
    }

    #[tokio::test]
    async fn traces_are_returned_on_request() {
        let orch = orchestrator(Arc::new(ScriptedCompletion::fixed("ok")));
        let mut request = AuraRequest::new("build");
        request.max_iterations = 1;
        request.include_traces = true;

        let response = orch.process_request(&request).await.unwrap();
        let traces = response.traces.unwrap();
        assert!(traces.iter().any(|t| t.action == "complete_synthesis"));
        assert!(traces.iter().any(|t| t.action == "start_planning"));
    }

    #[tokio::test]
    async fn metrics_are_attached_or_degrade() {
        struct Gateway(bool);

        #[async_trait::async_trait]
        impl MetricsService for Gateway {
            async fn compute_metrics(&self, hint: Option<&str>) -> Result<Option<QuantumReading>, MetricsError> {
                if self.0 {
                    Ok(Some(QuantumReading {
                        metrics: QuantumMetrics::new(0.8, 0.1, 0.9, 0.7),
                        backend: hint.unwrap_or("simulator").to_string(),
                    }))
                } else {
                    Err(MetricsError::Transport("refused".into()))
                }
            }
        }

        let mut request = AuraRequest::new("build");
        request.max_iterations = 1;

        for healthy in [true, false] {
            let mut d = deps(Arc::new(ScriptedCompletion::fixed("ok")));
            d.metrics = Arc::new(Gateway(healthy));
            let orch = Orchestrator::new(Uuid::new_v4(), None, d);
            let response = orch.process_request(&request).await.unwrap();
            assert_eq!(response.consciousness_metrics.is_some(), healthy);
            assert_eq!(response.quantum_backend_used.as_deref() == Some("simulator"), healthy);
        }
    }

    #[test]
    fn lattice_coherence_is_mean_score() {
        let orch = orchestrator(Arc::new(ScriptedCompletion::fixed("")));
        for (agent_type, score) in AgentType::ALL.iter().zip([0.2, 0.4, 0.6, 0.8, 1.0, 0.0]) {
            orch.agent(*agent_type).update_optimization_score(score);
        }

        let lattice = orch.lattice();
        assert_eq!(lattice.nodes.len(), 6);
        assert!((lattice.lattice_coherence - 0.5).abs() < 1e-9);
        assert_eq!(lattice.active_agents, 0);
    }
}
