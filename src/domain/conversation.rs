use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::agents::types::AgentType;

/// Author of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
    Agent,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
            MessageRole::Agent => "agent",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "user" => Some(MessageRole::User),
            "assistant" => Some(MessageRole::Assistant),
            "system" => Some(MessageRole::System),
            "agent" => Some(MessageRole::Agent),
            _ => None,
        }
    }
}

/// One entry of a session conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<AgentType>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            agent_id: None,
            agent_type: None,
            metadata: Map::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::System, content)
    }

    pub fn agent(content: impl Into<String>, agent_id: impl Into<String>, agent_type: AgentType) -> Self {
        Self {
            agent_id: Some(agent_id.into()),
            agent_type: Some(agent_type),
            ..Self::with_role(MessageRole::Agent, content)
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// Append-only, time-ordered record of one session's messages.
///
/// Messages are owned by the log and never modified after `append`; the only
/// way to remove them is [`ConversationLog::clear`] on an explicit session reset.
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log pre-populated with persisted history (oldest first)
    pub fn seeded(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Most recent `n` messages, oldest first
    pub fn recent(&self, n: usize) -> &[Message] {
        let skip = self.messages.len().saturating_sub(n);
        &self.messages[skip..]
    }

    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == MessageRole::User)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_preserves_order() {
        let mut log = ConversationLog::new();
        log.append(Message::user("q"));
        log.append(Message::agent("a1", "architect_1", AgentType::Architect));
        log.append(Message::assistant("final"));

        let roles: Vec<MessageRole> = log.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![MessageRole::User, MessageRole::Agent, MessageRole::Assistant]);
        assert_eq!(log.recent(2).len(), 2);
        assert_eq!(log.recent(10).len(), 3);
        assert_eq!(log.last_user_message().map(|m| m.content.as_str()), Some("q"));
    }

    #[test]
    fn message_round_trips_through_json() {
        let message = Message::agent("body", "engineer_1", AgentType::Engineer)
            .with_metadata("confidence", Value::from(0.9));
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["role"], "agent");
        assert_eq!(json["agent_type"], "engineer");

        let back: Message = serde_json::from_value(json).unwrap();
        assert_eq!(back, message);
    }

    #[test]
    fn role_parse_matches_as_str() {
        for role in [MessageRole::User, MessageRole::Assistant, MessageRole::System, MessageRole::Agent] {
            assert_eq!(MessageRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(MessageRole::parse("robot"), None);
    }
}
