use uuid::Uuid;

/// Domain events that occur within the Session aggregate
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Fired when a session is created
    Created {
        session_id: Uuid,
        user_id: Uuid,
        session_type: String,
    },
    /// Fired when the owner ends the session
    Ended { session_id: Uuid },
}

impl SessionEvent {
    /// Returns the session_id for this event
    pub fn session_id(&self) -> Uuid {
        match self {
            SessionEvent::Created { session_id, .. } => *session_id,
            SessionEvent::Ended { session_id } => *session_id,
        }
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::Created { .. } => "session_created",
            SessionEvent::Ended { .. } => "session_ended",
        }
    }
}
