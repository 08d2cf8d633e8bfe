// Best-effort recovery of the Architect's structured plan from free-form text

use serde::{Deserialize, Serialize};

/// Plan complexity as estimated by the Architect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Complexity::Low),
            "medium" => Some(Complexity::Medium),
            "high" => Some(Complexity::High),
            _ => None,
        }
    }

    /// Optimisation score the Architect assigns to a plan of this complexity
    pub fn score(&self) -> f64 {
        match self {
            Complexity::Low => 0.9,
            Complexity::Medium => 0.7,
            Complexity::High => 0.5,
        }
    }
}

/// Architectural plan extracted from a completion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchitecturePlan {
    pub analysis: String,
    pub plan: String,
    pub steps: Vec<String>,
    pub architecture: String,
    pub resources: Vec<String>,
    pub agents_needed: Vec<String>,
    pub estimated_complexity: Complexity,
    /// False when the fallback structure was used
    pub structured: bool,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawPlan {
    analysis: Option<String>,
    plan: Option<String>,
    steps: Vec<serde_json::Value>,
    architecture: Option<String>,
    resources: Vec<serde_json::Value>,
    agents_needed: Vec<serde_json::Value>,
    estimated_complexity: Option<String>,
}

fn strings(values: Vec<serde_json::Value>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| match v {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .collect()
}

impl ArchitecturePlan {
    /// Extracts the JSON object spanning the first `{` to the last `}`.
    ///
    /// Never fails: text without a usable object yields a fallback plan whose
    /// analysis and plan carry the raw text.
    pub fn extract(text: &str) -> Self {
        let candidate = match (text.find('{'), text.rfind('}')) {
            (Some(start), Some(end)) if end > start => Some(&text[start..=end]),
            _ => None,
        };

        let Some(json) = candidate else {
            return Self::fallback(
                text,
                vec!["Review architecture".to_string(), "Implement solution".to_string()],
                "To be defined",
                vec!["engineer".to_string()],
            );
        };

        match serde_json::from_str::<RawPlan>(json) {
            Ok(raw) => Self {
                analysis: raw.analysis.unwrap_or_default(),
                plan: raw.plan.unwrap_or_default(),
                steps: strings(raw.steps),
                architecture: raw.architecture.unwrap_or_default(),
                resources: strings(raw.resources),
                agents_needed: strings(raw.agents_needed),
                estimated_complexity: raw
                    .estimated_complexity
                    .as_deref()
                    .and_then(Complexity::parse)
                    .unwrap_or(Complexity::Medium),
                structured: true,
            },
            Err(_) => Self::fallback(text, Vec::new(), "", Vec::new()),
        }
    }

    fn fallback(text: &str, steps: Vec<String>, architecture: &str, agents: Vec<String>) -> Self {
        Self {
            analysis: text.to_string(),
            plan: text.to_string(),
            steps,
            architecture: architecture.to_string(),
            resources: Vec::new(),
            agents_needed: agents,
            estimated_complexity: Complexity::Medium,
            structured: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_embedded_json() {
        let text = r#"Here is the plan:
        {"analysis": "a", "plan": "p", "steps": ["one", "two", 3],
         "architecture": "layered", "resources": [], "agents_needed": ["engineer"],
         "estimated_complexity": "Low"}
        Good luck."#;

        let plan = ArchitecturePlan::extract(text);
        assert!(plan.structured);
        assert_eq!(plan.steps, vec!["one", "two", "3"]);
        assert_eq!(plan.estimated_complexity, Complexity::Low);
        assert_eq!(plan.estimated_complexity.score(), 0.9);
    }

    #[test]
    fn missing_json_uses_default_steps() {
        let plan = ArchitecturePlan::extract("just prose, no structure");
        assert!(!plan.structured);
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.agents_needed, vec!["engineer"]);
        assert_eq!(plan.estimated_complexity, Complexity::Medium);
    }

    #[test]
    fn invalid_json_uses_empty_fallback() {
        let plan = ArchitecturePlan::extract("{ not: json }");
        assert!(!plan.structured);
        assert!(plan.steps.is_empty());
        assert_eq!(plan.analysis, "{ not: json }");
    }

    #[test]
    fn unknown_complexity_defaults_to_medium() {
        let plan = ArchitecturePlan::extract(r#"{"estimated_complexity": "galactic"}"#);
        assert!(plan.structured);
        assert_eq!(plan.estimated_complexity, Complexity::Medium);
    }

    #[test]
    fn reversed_braces_are_not_json() {
        let plan = ArchitecturePlan::extract("} then {");
        assert!(!plan.structured);
        assert_eq!(plan.steps.len(), 2);
    }
}
