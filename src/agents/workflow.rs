use serde::Serialize;

use super::types::{AgentResponse, AgentType};

/// Confidence at which the iteration loop may stop early
pub const STOP_CONFIDENCE: f64 = 0.9;

/// Task category selected by keyword classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Workflow {
    Debugging,
    Review,
    Research,
    Implementation,
}

const DEBUGGING_KEYWORDS: &[&str] = &["error", "bug", "debug", "fix", "broken", "failing"];
const REVIEW_KEYWORDS: &[&str] = &["review", "check", "audit", "improve"];
const RESEARCH_KEYWORDS: &[&str] = &["how to", "what is", "explain", "research", "find"];

impl Workflow {
    /// Classifies a task by case-insensitive substring match.
    ///
    /// Categories are checked in priority order (debugging, review, research);
    /// the first one with a matching keyword wins, otherwise implementation.
    pub fn classify(task: &str) -> Self {
        let lower = task.to_lowercase();
        let matches = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

        if matches(DEBUGGING_KEYWORDS) {
            Workflow::Debugging
        } else if matches(REVIEW_KEYWORDS) {
            Workflow::Review
        } else if matches(RESEARCH_KEYWORDS) {
            Workflow::Research
        } else {
            Workflow::Implementation
        }
    }

    /// Ordered agent sequence for this workflow
    pub fn agents(&self) -> &'static [AgentType] {
        match self {
            Workflow::Debugging => &[AgentType::Debugger, AgentType::Engineer, AgentType::Reviewer],
            Workflow::Review => &[AgentType::Reviewer, AgentType::Engineer],
            Workflow::Research => &[AgentType::Research, AgentType::Architect],
            Workflow::Implementation => &[AgentType::Architect, AgentType::Engineer, AgentType::Reviewer],
        }
    }
}

/// Stopping policy, evaluated once after each full iteration.
///
/// `iteration` is zero-based. Only the latest response's confidence is
/// considered.
pub fn should_continue(responses: &[AgentResponse], iteration: u32, max_iterations: u32) -> bool {
    if iteration + 1 >= max_iterations {
        return false;
    }

    match responses.last() {
        None => true,
        Some(last) => last.confidence < STOP_CONFIDENCE,
    }
}
