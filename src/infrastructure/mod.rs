// Infrastructure layer module
// Contains database adapters and external service integrations
// Follows Hexagonal Architecture

pub mod llm;
pub mod quantum;
pub mod repositories;
