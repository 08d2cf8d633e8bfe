// Repository ports
// Implemented by infrastructure adapters (PostgreSQL, in-memory)

pub mod message_repository;
pub mod session_repository;
pub mod usage_repository;

pub use message_repository::MessageRepository;
pub use session_repository::SessionRepository;
pub use usage_repository::UsageRepository;
