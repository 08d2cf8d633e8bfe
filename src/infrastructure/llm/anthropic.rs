use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::agents::completion::{CompletionError, CompletionMessage, CompletionRequest, CompletionRole, CompletionService};

const API_VERSION: &str = "2023-06-01";

/// Connection settings for the Anthropic Messages API
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

/// Claude (Anthropic) completion backend.
pub struct AnthropicCompletionService {
    config: AnthropicConfig,
    http: reqwest::Client,
}

impl AnthropicCompletionService {
    pub fn new(config: AnthropicConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ClaudeMessage {
    role: CompletionRole,
    content: String,
}

/// Merges consecutive turns of the same role and drops leading assistant
/// turns; the API expects a conversation that opens with the user.
fn normalize_turns(messages: Vec<CompletionMessage>) -> Vec<ClaudeMessage> {
    let mut turns: Vec<ClaudeMessage> = Vec::with_capacity(messages.len());
    for message in messages {
        if turns.is_empty() && message.role == CompletionRole::Assistant {
            continue;
        }
        match turns.last_mut() {
            Some(last) if last.role == message.role => {
                last.content.push_str("\n\n");
                last.content.push_str(&message.content);
            }
            _ => turns.push(ClaudeMessage {
                role: message.role,
                content: message.content,
            }),
        }
    }
    turns
}

/// Concatenates the text blocks of a Messages API response
fn parse_claude_response(body: &Value) -> Result<String, CompletionError> {
    let blocks = body
        .get("content")
        .and_then(Value::as_array)
        .ok_or_else(|| CompletionError::Decode("response has no content array".to_string()))?;

    Ok(blocks
        .iter()
        .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join(""))
}

#[async_trait]
impl CompletionService for AnthropicCompletionService {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let url = format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'));

        let body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "system": request.system_prompt,
            "messages": normalize_turns(request.messages),
        });

        let resp = self
            .http
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(CompletionError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let resp_body: Value = resp
            .json()
            .await
            .map_err(|e| CompletionError::Decode(e.to_string()))?;

        parse_claude_response(&resp_body)
    }
}
