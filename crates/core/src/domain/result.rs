// Validation Result Domain Model

use serde::Serialize;

use super::token::TokenRejection;

/// Which flow produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActionType {
    #[serde(rename = "QueueAction")]
    Queue,
    #[serde(rename = "CancelAction")]
    Cancel,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Queue => write!(f, "QueueAction"),
            ActionType::Cancel => write!(f, "CancelAction"),
        }
    }
}

/// Reason behind a redirect
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectKind {
    /// No admission yet: send the visitor to the queue
    Queue,
    /// Token refused: send the visitor to the queue service's error page
    Error(TokenRejection),
    /// Admission cancelled: let the queue service release the slot
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectTarget {
    pub kind: RedirectKind,
    pub url: String,
}

/// Outcome of a validation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Let the request through
    Proceed,
    /// Answer with a redirect
    Redirect(RedirectTarget),
}

/// Result handed back to the HTTP layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestValidationResult {
    pub action_type: ActionType,
    pub event_id: String,
    pub queue_id: Option<String>,
    pub decision: Decision,
}

impl RequestValidationResult {
    pub fn proceed(
        action_type: ActionType,
        event_id: impl Into<String>,
        queue_id: Option<String>,
    ) -> Self {
        Self {
            action_type,
            event_id: event_id.into(),
            queue_id,
            decision: Decision::Proceed,
        }
    }

    pub fn redirect(
        action_type: ActionType,
        event_id: impl Into<String>,
        queue_id: Option<String>,
        kind: RedirectKind,
        url: String,
    ) -> Self {
        Self {
            action_type,
            event_id: event_id.into(),
            queue_id,
            decision: Decision::Redirect(RedirectTarget { kind, url }),
        }
    }

    pub fn does_redirect(&self) -> bool {
        matches!(self.decision, Decision::Redirect(_))
    }

    pub fn redirect_url(&self) -> Option<&str> {
        match &self.decision {
            Decision::Redirect(target) => Some(&target.url),
            Decision::Proceed => None,
        }
    }

    pub fn redirect_kind(&self) -> Option<&RedirectKind> {
        match &self.decision {
            Decision::Redirect(target) => Some(&target.kind),
            Decision::Proceed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proceed_has_no_redirect() {
        let result =
            RequestValidationResult::proceed(ActionType::Queue, "evt1", Some("q1".to_string()));
        assert!(!result.does_redirect());
        assert_eq!(result.redirect_url(), None);
        assert_eq!(result.redirect_kind(), None);
    }

    #[test]
    fn test_serialize_error_redirect() {
        let result = RequestValidationResult::redirect(
            ActionType::Queue,
            "evt1",
            None,
            RedirectKind::Error(TokenRejection::SignatureMismatch),
            "https://q.example.com/error/hash/?c=c".to_string(),
        );

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["action_type"], "QueueAction");
        assert_eq!(json["queue_id"], serde_json::Value::Null);
        assert_eq!(
            json["decision"]["redirect"]["url"],
            "https://q.example.com/error/hash/?c=c"
        );
        assert_eq!(
            json["decision"]["redirect"]["kind"]["error"],
            "signature_mismatch"
        );
    }

    #[test]
    fn test_display_action_type() {
        assert_eq!(ActionType::Queue.to_string(), "QueueAction");
        assert_eq!(ActionType::Cancel.to_string(), "CancelAction");
    }
}
