// LLM provider adapters implementing the completion port

pub mod anthropic;

pub use anthropic::{AnthropicCompletionService, AnthropicConfig};
