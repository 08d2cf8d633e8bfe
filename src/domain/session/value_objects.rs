use serde::{Deserialize, Serialize};

/// Lifecycle status of a session
///
/// # Status Transitions
/// ```text
/// Active -> Ended
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Session accepts requests
    Active,
    /// Session was closed by its owner
    Ended,
}

impl SessionStatus {
    /// Checks if a transition from current status to next status is valid
    ///
    /// # Example
    /// ```
    /// use aura_api::domain::session::value_objects::SessionStatus;
    ///
    /// assert!(SessionStatus::Active.can_transition_to(SessionStatus::Ended));
    /// assert!(!SessionStatus::Ended.can_transition_to(SessionStatus::Active));
    /// ```
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        matches!((self, next), (SessionStatus::Active, SessionStatus::Ended))
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "active" => Ok(SessionStatus::Active),
            "ended" => Ok(SessionStatus::Ended),
            other => Err(format!("Unknown session status: {}", other)),
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Active => write!(f, "active"),
            SessionStatus::Ended => write!(f, "ended"),
        }
    }
}
