// Domain layer module exports
// Domain is independent of infrastructure concerns

pub mod conversation;
pub mod repositories;
pub mod session;
pub mod usage;
