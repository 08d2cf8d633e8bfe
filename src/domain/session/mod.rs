// Session domain module
// Contains the session aggregate root, its status and domain events

#![allow(clippy::module_inception)]

pub mod events;
pub mod session;
pub mod value_objects;

pub use events::SessionEvent;
pub use session::{Session, DEFAULT_SESSION_TYPE};
pub use value_objects::SessionStatus;
