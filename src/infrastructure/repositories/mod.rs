// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

pub mod in_memory;
pub mod postgres_message_repository;
pub mod postgres_session_repository;
pub mod postgres_usage_repository;

pub use in_memory::{InMemoryMessageRepository, InMemorySessionRepository, InMemoryUsageRepository};
pub use postgres_message_repository::PostgresMessageRepository;
pub use postgres_session_repository::PostgresSessionRepository;
pub use postgres_usage_repository::PostgresUsageRepository;
