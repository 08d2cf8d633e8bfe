// Per-variant behaviour of the shared agent state machine
//
// A profile is plain data plus one assessment function: how much history the
// agent sees, how large its completion may be and how it scores its own output.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value};

use super::plan::ArchitecturePlan;
use super::types::{AgentType, Metrics};

/// How an agent consumes conversation history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryPolicy {
    /// Most recent `n` messages
    Recent(usize),
    /// Only the latest user message, framed as the original request
    LastUserMessage,
}

/// Temperature used for the completion call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TemperaturePolicy {
    FromRequest,
    Fixed(f32),
}

/// Result of scoring one completion
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    /// Confidence in [0, 1]; also becomes the agent's optimisation score
    pub confidence: f64,
    pub metrics: Metrics,
    /// Structured output recorded on the completion trace
    pub output: Value,
    /// Knowledge merged into long-term memory
    pub knowledge: Option<serde_json::Map<String, Value>>,
}

impl Assessment {
    fn new(confidence: f64, output: Value) -> Self {
        Self {
            confidence: confidence.clamp(0.0, 1.0),
            metrics: Metrics::new(),
            output,
            knowledge: None,
        }
    }

    fn metric(mut self, key: &str, value: f64) -> Self {
        self.metrics.insert(key.to_string(), value);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentProfile {
    pub agent_type: AgentType,
    pub history: HistoryPolicy,
    pub max_tokens: u32,
    pub temperature: TemperaturePolicy,
    /// Trace action stem (`start_<action>`, `complete_<action>`, `<action>_error`)
    pub action: &'static str,
    /// Prefix of the short-term memory entry written at task start
    pub memory_verb: &'static str,
}

impl AgentProfile {
    pub fn for_type(agent_type: AgentType) -> Self {
        let (history, max_tokens, temperature, action, memory_verb) = match agent_type {
            AgentType::Architect => (
                HistoryPolicy::Recent(5),
                4096,
                TemperaturePolicy::FromRequest,
                "planning",
                "Processing task",
            ),
            AgentType::Engineer => (
                HistoryPolicy::Recent(10),
                8000,
                TemperaturePolicy::FromRequest,
                "implementation",
                "Implementing",
            ),
            AgentType::Reviewer => (
                HistoryPolicy::Recent(8),
                6000,
                TemperaturePolicy::FromRequest,
                "review",
                "Reviewing",
            ),
            AgentType::Debugger => (
                HistoryPolicy::Recent(6),
                5000,
                TemperaturePolicy::FromRequest,
                "debugging",
                "Debugging",
            ),
            AgentType::Research => (
                HistoryPolicy::Recent(6),
                6000,
                TemperaturePolicy::FromRequest,
                "research",
                "Researching",
            ),
            AgentType::Synthesizer => (
                HistoryPolicy::LastUserMessage,
                8000,
                TemperaturePolicy::Fixed(0.5),
                "synthesis",
                "Synthesizing",
            ),
        };

        Self {
            agent_type,
            history,
            max_tokens,
            temperature,
            action,
            memory_verb,
        }
    }

    pub fn temperature(&self, requested: f32) -> f32 {
        match self.temperature {
            TemperaturePolicy::FromRequest => requested,
            TemperaturePolicy::Fixed(t) => t,
        }
    }

    /// Scores a completion. `integrated` is the number of agent outputs the
    /// Synthesizer merged; other variants ignore it.
    pub fn assess(&self, text: &str, integrated: usize) -> Assessment {
        match self.agent_type {
            AgentType::Architect => assess_plan(text),
            AgentType::Engineer => assess_implementation(text),
            AgentType::Reviewer => assess_review(text),
            AgentType::Debugger => assess_debugging(text),
            AgentType::Research => assess_research(text),
            AgentType::Synthesizer => assess_synthesis(text, integrated),
        }
    }
}

fn assess_plan(text: &str) -> Assessment {
    let plan = ArchitecturePlan::extract(text);
    let score = plan.estimated_complexity.score();
    let steps = plan.steps.len() as f64;
    let output = serde_json::to_value(&plan).unwrap_or(Value::Null);

    let mut assessment = Assessment::new(score, output.clone()).metric("plan_steps", steps);
    let mut knowledge = serde_json::Map::new();
    knowledge.insert("last_plan".to_string(), output);
    assessment.knowledge = Some(knowledge);
    assessment
}

fn assess_implementation(text: &str) -> Assessment {
    let fences = text.matches("```").count();
    let score = (0.7 + fences as f64 / 10.0).min(0.95);
    Assessment::new(
        score,
        json!({ "response_length": text.chars().count(), "code_blocks": fences }),
    )
    .metric("code_blocks", fences as f64)
    .metric("response_length", text.chars().count() as f64)
}

fn assess_review(text: &str) -> Assessment {
    let lower = text.to_lowercase();
    let score = if lower.contains("approve") {
        0.9
    } else if lower.contains("needs_changes") {
        0.7
    } else {
        0.5
    };
    Assessment::new(score, json!({ "quality_score": score })).metric("quality_score", score)
}

fn confidence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"confidence[:\s]+([0-9.]+)").expect("static regex"))
}

fn assess_debugging(text: &str) -> Assessment {
    let lower = text.to_lowercase();
    let stated = confidence_pattern()
        .captures(&lower)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().trim_end_matches('.').parse::<f64>().ok())
        .filter(|v| v.is_finite());
    let score = stated.map(|v| v.min(1.0)).unwrap_or(0.8);
    Assessment::new(score, json!({ "confidence": score })).metric("confidence", score)
}

fn assess_research(text: &str) -> Assessment {
    let lower = text.to_lowercase();
    let score = if text.chars().count() < 200 {
        0.6
    } else if lower.contains("not found") || lower.contains("unable to") {
        0.5
    } else {
        0.85
    };
    Assessment::new(score, json!({ "relevance": score }))
        .metric("relevance", score)
        .metric("response_length", text.chars().count() as f64)
}

fn assess_synthesis(text: &str, integrated: usize) -> Assessment {
    let quality = (0.7 + integrated as f64 * 0.05).min(0.95);
    Assessment::new(quality, json!({ "quality": quality, "agent_count": integrated }))
        .metric("quality", quality)
        .metric("agents_synthesized", integrated as f64)
        .metric("response_length", text.chars().count() as f64)
}
