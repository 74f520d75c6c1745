// Session State Domain Model

/// Admission record for one event, as reported by the state repository
///
/// Only a valid state carries a queue id, so an invalid state can never leak
/// a stale one into a decision.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Invalid,
    Valid {
        queue_id: String,
        extendable: bool,
    },
}

impl SessionState {
    pub fn valid(queue_id: impl Into<String>, extendable: bool) -> Self {
        SessionState::Valid {
            queue_id: queue_id.into(),
            extendable,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, SessionState::Valid { .. })
    }

    pub fn is_state_extendable(&self) -> bool {
        matches!(
            self,
            SessionState::Valid {
                extendable: true,
                ..
            }
        )
    }

    pub fn queue_id(&self) -> Option<&str> {
        match self {
            SessionState::Valid { queue_id, .. } => Some(queue_id),
            SessionState::Invalid => None,
        }
    }
}
