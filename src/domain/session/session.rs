use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::events::SessionEvent;
use super::value_objects::SessionStatus;

/// Default session type for chat sessions
pub const DEFAULT_SESSION_TYPE: &str = "aura_chat";

/// Session aggregate root
///
/// One user's conversation with the agent lattice. While active it owns at
/// most one orchestrator; ending the session releases it.
///
/// # Invariants
/// - Session type cannot be empty
/// - Only `Active -> Ended` is a valid transition
/// - `ended_at` is set exactly when the status is `Ended`
///
/// # Example
/// ```
/// use aura_api::domain::session::Session;
/// use uuid::Uuid;
///
/// let (session, events) = Session::new(Uuid::new_v4(), "aura_chat", Default::default())
///     .expect("valid session");
///
/// assert!(session.is_active());
/// assert_eq!(events.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    id: Uuid,
    user_id: Uuid,
    session_type: String,
    status: SessionStatus,
    metadata: Map<String, Value>,
    created_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Creates a new active Session
    ///
    /// # Returns
    /// * `Ok((Session, Vec<SessionEvent>))` - New session and events generated
    /// * `Err(String)` - If the session type is empty
    pub fn new(
        user_id: Uuid,
        session_type: impl Into<String>,
        metadata: Map<String, Value>,
    ) -> Result<(Self, Vec<SessionEvent>), String> {
        let session_type = session_type.into();
        if session_type.trim().is_empty() {
            return Err("Session type cannot be empty".to_string());
        }

        let session = Self {
            id: Uuid::new_v4(),
            user_id,
            session_type,
            status: SessionStatus::Active,
            metadata,
            created_at: Utc::now(),
            ended_at: None,
        };

        let events = vec![SessionEvent::Created {
            session_id: session.id,
            user_id: session.user_id,
            session_type: session.session_type.clone(),
        }];

        Ok((session, events))
    }

    /// Ends the session
    ///
    /// # Returns
    /// * `Ok(SessionEvent)` - Ended event generated
    /// * `Err(String)` - If the session already ended
    pub fn end(&mut self) -> Result<SessionEvent, String> {
        let next_status = SessionStatus::Ended;
        if !self.status.can_transition_to(next_status) {
            return Err(format!("Cannot end session in {} status", self.status));
        }

        self.status = next_status;
        self.ended_at = Some(Utc::now());

        Ok(SessionEvent::Ended { session_id: self.id })
    }

    /// True when `user_id` owns this session
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn session_type(&self) -> &str {
        &self.session_type
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Reconstructs a Session from persistence layer data
    ///
    /// Only to be used by repository implementations.
    pub fn from_persistence(
        id: Uuid,
        user_id: Uuid,
        session_type: String,
        status: SessionStatus,
        metadata: Map<String, Value>,
        created_at: DateTime<Utc>,
        ended_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            user_id,
            session_type,
            status,
            metadata,
            created_at,
            ended_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_session_generates_created_event() {
        let user_id = Uuid::new_v4();
        let (session, events) = Session::new(user_id, DEFAULT_SESSION_TYPE, Map::new()).unwrap();

        assert_eq!(session.user_id(), user_id);
        assert_eq!(session.status(), SessionStatus::Active);
        assert!(session.ended_at().is_none());
        assert_eq!(
            events,
            vec![SessionEvent::Created {
                session_id: session.id(),
                user_id,
                session_type: DEFAULT_SESSION_TYPE.to_string(),
            }]
        );
    }

    #[test]
    fn empty_session_type_fails() {
        let result = Session::new(Uuid::new_v4(), "  ", Map::new());
        assert!(result.unwrap_err().contains("Session type cannot be empty"));
    }

    #[test]
    fn end_is_allowed_once() {
        let (mut session, _) = Session::new(Uuid::new_v4(), DEFAULT_SESSION_TYPE, Map::new()).unwrap();

        let event = session.end().unwrap();
        assert_eq!(event.session_id(), session.id());
        assert_eq!(session.status(), SessionStatus::Ended);
        assert!(session.ended_at().is_some());

        assert!(session.end().is_err());
    }

    #[test]
    fn ownership_check() {
        let owner = Uuid::new_v4();
        let (session, _) = Session::new(owner, DEFAULT_SESSION_TYPE, Map::new()).unwrap();
        assert!(session.is_owned_by(owner));
        assert!(!session.is_owned_by(Uuid::new_v4()));
    }
}
