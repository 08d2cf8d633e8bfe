//! Orchestration properties exercised through the public API
//!
//! A scripted completion service drives the agents deterministically.

use std::sync::Arc;

use async_trait::async_trait;
use aura_api::agents::agent::AgentSettings;
use aura_api::agents::completion::{CompletionError, CompletionService, ScriptedCompletion};
use aura_api::agents::events::{EventSink, NoopEventSink, OrchestratorEvent};
use aura_api::agents::metrics::DisabledMetricsService;
use aura_api::agents::orchestrator::{Orchestrator, OrchestratorDeps};
use aura_api::agents::request::AuraRequest;
use aura_api::agents::types::{AgentStatus, AgentType};
use aura_api::agents::workflow::Workflow;
use aura_api::domain::conversation::MessageRole;
use parking_lot::Mutex;
use uuid::Uuid;

fn deps(completion: Arc<dyn CompletionService>, events: Arc<dyn EventSink>) -> OrchestratorDeps {
    OrchestratorDeps {
        completion,
        metrics: Arc::new(DisabledMetricsService),
        events,
        settings: AgentSettings::default(),
    }
}

fn orchestrator(completion: Arc<dyn CompletionService>) -> Orchestrator {
    Orchestrator::new(Uuid::new_v4(), None, deps(completion, Arc::new(NoopEventSink)))
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<OrchestratorEvent>>,
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn publish(&self, _session_id: Uuid, event: OrchestratorEvent) {
        self.events.lock().push(event);
    }
}

#[test]
fn workflow_classification_examples() {
    let agents = |task: &str| Workflow::classify(task).agents().to_vec();

    assert_eq!(
        agents("please fix this error"),
        vec![AgentType::Debugger, AgentType::Engineer, AgentType::Reviewer]
    );
    assert_eq!(agents("can you review my code"), vec![AgentType::Reviewer, AgentType::Engineer]);
    assert_eq!(agents("what is a qubit"), vec![AgentType::Research, AgentType::Architect]);
    assert_eq!(
        agents("build me a login page"),
        vec![AgentType::Architect, AgentType::Engineer, AgentType::Reviewer]
    );
    assert_eq!(Workflow::classify("review this error"), Workflow::Debugging);
}

#[tokio::test]
async fn synthesizer_runs_exactly_once_even_when_every_agent_fails() {
    for max_iterations in [1, 3] {
        let completion = Arc::new(ScriptedCompletion::new(|_| {
            Err(CompletionError::Transport("provider unreachable".into()))
        }));
        let orch = orchestrator(completion.clone());
        let mut request = AuraRequest::new("build me a login page");
        request.max_iterations = max_iterations;

        assert!(orch.process_request(&request).await.is_err());

        // three loop agents per iteration plus one synthesis attempt
        assert_eq!(completion.calls(), 3 * max_iterations as usize + 1);
        let synthesis_traces = orch
            .agent(AgentType::Synthesizer)
            .traces()
            .into_iter()
            .filter(|t| t.action == "start_synthesis")
            .count();
        assert_eq!(synthesis_traces, 1);
    }
}

#[tokio::test]
async fn confident_last_response_stops_the_loop() {
    // four fences push the engineer to 0.95
    let text = "```rust\nfn a() {}\n```\n```rust\nfn b() {}\n```";
    for max_iterations in [1, 2, 5, 20] {
        let completion = Arc::new(ScriptedCompletion::fixed(text));
        let orch = orchestrator(completion.clone());
        let mut request = AuraRequest::new("review my code");
        request.max_iterations = max_iterations;

        let response = orch.process_request(&request).await.unwrap();

        assert_eq!(response.total_iterations, 1);
        assert_eq!(completion.calls(), 3);
        let engineer = &response.agent_responses[1];
        assert_eq!(engineer.agent_type, AgentType::Engineer);
        assert!((engineer.confidence - 0.95).abs() < 1e-9);
    }
}

#[tokio::test]
async fn never_exceeds_max_iterations() {
    let completion = Arc::new(ScriptedCompletion::fixed("needs work"));
    let orch = orchestrator(completion.clone());
    let mut request = AuraRequest::new("what is a qubit");
    request.max_iterations = 4;

    let response = orch.process_request(&request).await.unwrap();

    assert_eq!(response.total_iterations, 4);
    assert_eq!(completion.calls(), 4 * 2 + 1);
}

#[tokio::test]
async fn concurrent_requests_on_one_session_do_not_interleave() {
    let completion = Arc::new(ScriptedCompletion::fixed("needs work"));
    let orch = Arc::new(orchestrator(completion));
    let mut request = AuraRequest::new("build a cache");
    request.max_iterations = 2;

    let (a, b) = tokio::join!(orch.process_request(&request), orch.process_request(&request));
    a.unwrap();
    b.unwrap();

    let roles: Vec<MessageRole> = orch.conversation().iter().map(|m| m.role).collect();
    // each request: user, 6 agent messages, assistant
    let one_request: Vec<MessageRole> = std::iter::once(MessageRole::User)
        .chain(std::iter::repeat(MessageRole::Agent).take(6))
        .chain(std::iter::once(MessageRole::Assistant))
        .collect();
    assert_eq!(roles.len(), 16);
    assert_eq!(&roles[..8], one_request.as_slice());
    assert_eq!(&roles[8..], one_request.as_slice());
    assert_eq!(orch.total_iterations(), 4);
}

#[tokio::test]
async fn progress_events_follow_execution() {
    let sink = Arc::new(RecordingSink::default());
    let orch = Orchestrator::new(
        Uuid::new_v4(),
        None,
        deps(Arc::new(ScriptedCompletion::fixed("needs work")), sink.clone()),
    );
    let mut request = AuraRequest::new("what is a qubit");
    request.max_iterations = 1;
    request.stream = true;

    orch.process_request(&request).await.unwrap();

    let events = sink.events.lock();
    let statuses: Vec<(AgentType, AgentStatus)> = events
        .iter()
        .filter_map(|e| match e {
            OrchestratorEvent::AgentStatusChanged { agent_type, status, .. } => Some((*agent_type, *status)),
            _ => None,
        })
        .collect();
    assert_eq!(
        statuses,
        vec![
            (AgentType::Research, AgentStatus::Working),
            (AgentType::Research, AgentStatus::Completed),
            (AgentType::Architect, AgentStatus::Working),
            (AgentType::Architect, AgentStatus::Completed),
            (AgentType::Synthesizer, AgentStatus::Working),
            (AgentType::Synthesizer, AgentStatus::Completed),
        ]
    );

    let finals: Vec<bool> = events
        .iter()
        .filter_map(|e| match e {
            OrchestratorEvent::ResponseChunk { is_final, .. } => Some(*is_final),
            _ => None,
        })
        .collect();
    assert_eq!(finals, vec![false, false, true]);

    let lattices = events
        .iter()
        .filter(|e| matches!(e, OrchestratorEvent::LatticeChanged(_)))
        .count();
    assert_eq!(lattices, 2);
}

#[tokio::test]
async fn agent_failure_is_reported_and_skipped() {
    let sink = Arc::new(RecordingSink::default());
    let completion = Arc::new(ScriptedCompletion::new(|request| {
        if request.system_prompt.starts_with("You are the Research Agent") {
            Err(CompletionError::Provider {
                status: 500,
                body: "boom".into(),
            })
        } else {
            Ok("needs work".into())
        }
    }));
    let orch = Orchestrator::new(Uuid::new_v4(), None, deps(completion, sink.clone()));
    let mut request = AuraRequest::new("what is a qubit");
    request.max_iterations = 1;

    let response = orch.process_request(&request).await.unwrap();

    let kinds: Vec<AgentType> = response.agent_responses.iter().map(|r| r.agent_type).collect();
    assert_eq!(kinds, vec![AgentType::Architect, AgentType::Synthesizer]);
    assert_eq!(orch.agent(AgentType::Research).status(), AgentStatus::Error);
    assert!(sink
        .events
        .lock()
        .iter()
        .any(|e| matches!(e, OrchestratorEvent::AgentFailed { agent_type: AgentType::Research, .. })));
}
