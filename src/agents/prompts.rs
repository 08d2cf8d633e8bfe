// Prompt templates for completion calls
//
// Every agent variant owns one versioned template: a fixed system prompt and a
// user template rendered with `{{task}}` and `{{context}}` (and, for synthesis,
// `{{outputs}}`).

use std::collections::HashMap;

use super::types::AgentType;

/// Prompt template structure
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    pub name: &'static str,
    pub version: &'static str,
    pub system: &'static str,
    pub user_template: &'static str,
}

impl PromptTemplate {
    /// Render the user template, replacing `{{key}}` placeholders.
    ///
    /// Placeholders without a matching variable are left untouched.
    pub fn render(&self, variables: &HashMap<&str, String>) -> String {
        let mut out = String::with_capacity(self.user_template.len());
        let mut rest = self.user_template;

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let key = after[..end].trim();
                    match variables.get(key) {
                        Some(value) => out.push_str(value),
                        None => out.push_str(&rest[start..start + 2 + end + 2]),
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }

        out.push_str(rest);
        out
    }
}

/// Template for an agent variant
pub fn template_for(agent_type: AgentType) -> &'static PromptTemplate {
    match agent_type {
        AgentType::Architect => &library::ARCHITECT,
        AgentType::Engineer => &library::ENGINEER,
        AgentType::Reviewer => &library::REVIEWER,
        AgentType::Debugger => &library::DEBUGGER,
        AgentType::Research => &library::RESEARCH,
        AgentType::Synthesizer => &library::SYNTHESIZER,
    }
}

pub mod library {
    use super::PromptTemplate;

    pub static ARCHITECT: PromptTemplate = PromptTemplate {
        name: "architect",
        version: "1.0.0",
        system: "You are the Architect Agent of the AURA multi-agent system.\n\
                 You turn user goals into implementation plans: analyse the requirement, \
                 design the architecture, split the work into small steps and state what \
                 the Engineer needs to know.\n\
                 Answer with a JSON object holding: analysis, plan, steps, architecture, \
                 resources, agents_needed, estimated_complexity (low|medium|high).",
        user_template: "Task: {{task}}\n\n\
                        Context:\n{{context}}\n\n\
                        Produce the architectural plan as JSON:\n\
                        {\n  \"analysis\": \"...\",\n  \"plan\": \"...\",\n  \"steps\": [\"...\"],\n  \
                        \"architecture\": \"...\",\n  \"resources\": [\"...\"],\n  \
                        \"agents_needed\": [\"engineer\"],\n  \"estimated_complexity\": \"low|medium|high\"\n}",
    };

    pub static ENGINEER: PromptTemplate = PromptTemplate {
        name: "engineer",
        version: "1.0.0",
        system: "You are the Engineer Agent of the AURA multi-agent system.\n\
                 You implement the plan with complete, production-ready code, proper error \
                 handling and tests. Give every code block its file path and explain key \
                 decisions briefly.",
        user_template: "Implementation Task: {{task}}\n\n\
                        Context:\n{{context}}\n\n\
                        Implement it with complete code, validation and error handling, and \
                        show where each file lives.",
    };

    pub static REVIEWER: PromptTemplate = PromptTemplate {
        name: "reviewer",
        version: "1.0.0",
        system: "You are the Reviewer Agent of the AURA multi-agent system.\n\
                 You review implementations for correctness, security, performance, \
                 maintainability and test coverage.\n\
                 Start with a verdict (approve, needs_changes or reject), then list issues \
                 by severity (critical, major, minor) with concrete suggestions and a \
                 quality score between 0 and 1.",
        user_template: "Review Task: {{task}}\n\n\
                        Material to review:\n{{context}}\n\n\
                        Give the verdict (approve/needs_changes/reject), the issues with their \
                        severity, improvement suggestions and a quality score (0-1).",
    };

    pub static DEBUGGER: PromptTemplate = PromptTemplate {
        name: "debugger",
        version: "1.0.0",
        system: "You are the Debugger Agent of the AURA multi-agent system.\n\
                 You analyse errors and stack traces, find the root cause rather than the \
                 symptom and give step-by-step fixes.\n\
                 Finish with a line `Confidence: <0-1>`.",
        user_template: "Debug Task: {{task}}\n\n\
                        Error context:\n{{context}}\n\n\
                        Provide the error summary, root cause, fix instructions, prevention \
                        advice and your confidence level (0-1).",
    };

    pub static RESEARCH: PromptTemplate = PromptTemplate {
        name: "research",
        version: "1.0.0",
        system: "You are the Research Agent of the AURA multi-agent system.\n\
                 You gather the background knowledge other agents need: documentation, \
                 API details, examples and best practices. Be specific and \
                 implementation-ready.",
        user_template: "Research Task: {{task}}\n\n\
                        Context:\n{{context}}\n\n\
                        Give a summary, key findings, examples where useful, recommendations \
                        and caveats.",
    };

    pub static SYNTHESIZER: PromptTemplate = PromptTemplate {
        name: "synthesizer",
        version: "1.0.0",
        system: "You are the Synthesizer Agent of the AURA multi-agent system.\n\
                 You merge the outputs of the other agents into one coherent answer for the \
                 user. When agents disagree prefer Reviewer over Engineer over Architect.\n\
                 Answer in Markdown, concise and actionable.",
        user_template: "Synthesis Task: {{task}}\n\n\
                        Agent outputs to integrate:\n{{outputs}}\n\n\
                        Additional context:\n{{context}}\n\n\
                        Write the final response: integrate everything relevant, resolve \
                        conflicts and keep it actionable.",
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_known_variables() {
        let template = PromptTemplate {
            name: "t",
            version: "1",
            system: "",
            user_template: "Task: {{task}} / {{ context }}",
        };
        let vars = HashMap::from([("task", "ship".to_string()), ("context", "{}".to_string())]);
        assert_eq!(template.render(&vars), "Task: ship / {}");
    }

    #[test]
    fn render_keeps_unknown_and_unterminated_placeholders() {
        let template = PromptTemplate {
            name: "t",
            version: "1",
            system: "",
            user_template: "{{missing}} and {{open",
        };
        assert_eq!(template.render(&HashMap::new()), "{{missing}} and {{open");
    }

    #[test]
    fn rendered_value_is_not_rescanned() {
        let template = PromptTemplate {
            name: "t",
            version: "1",
            system: "",
            user_template: "{{task}}!",
        };
        let vars = HashMap::from([("task", "{{context}}".to_string())]);
        assert_eq!(template.render(&vars), "{{context}}!");
    }

    #[test]
    fn architect_template_keeps_json_braces() {
        let vars = HashMap::from([("task", "x".to_string()), ("context", "{}".to_string())]);
        let rendered = template_for(AgentType::Architect).render(&vars);
        assert!(rendered.contains("\"estimated_complexity\""));
        assert!(rendered.starts_with("Task: x"));
    }

    #[test]
    fn every_variant_has_a_distinct_template() {
        let names: std::collections::HashSet<_> =
            AgentType::ALL.iter().map(|t| template_for(*t).name).collect();
        assert_eq!(names.len(), AgentType::ALL.len());
    }
}
