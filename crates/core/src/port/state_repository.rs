// State Repository Port (Interface)

use crate::domain::SessionState;
use crate::error::Result;

/// Per-event admission record store
///
/// Implementations decide how state is persisted (cookies in production).
/// Expiry and tamper checks are theirs: `get_state` reports an invalid state
/// rather than an error for a missing, expired or forged record.
pub trait StateRepository: Send + Sync {
    /// Read the admission record of `event_id`
    fn get_state(&self, event_id: &str, secret_key: &str) -> Result<SessionState>;

    /// Write (or overwrite) the admission record of `event_id`
    ///
    /// # Arguments
    /// * `validity_minutes` - How long the admission stays valid from now
    /// * `cookie_domain` - Domain the record is scoped to (empty for host-only)
    fn store(
        &self,
        event_id: &str,
        queue_id: &str,
        is_state_extendable: bool,
        validity_minutes: u32,
        cookie_domain: &str,
        secret_key: &str,
    ) -> Result<()>;

    /// Drop the admission record of `event_id`
    fn cancel_queue_cookie(&self, event_id: &str, cookie_domain: &str) -> Result<()>;

    /// Push the expiry of a still-valid record `validity_minutes` past now
    fn extend_queue_cookie(
        &self,
        event_id: &str,
        validity_minutes: u32,
        cookie_domain: &str,
        secret_key: &str,
    ) -> Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::sync::{Arc, Mutex};

    /// Repository call as recorded by the mock
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum RepositoryCall {
        GetState {
            event_id: String,
        },
        Store {
            event_id: String,
            queue_id: String,
            is_state_extendable: bool,
            validity_minutes: u32,
            cookie_domain: String,
        },
        Cancel {
            event_id: String,
            cookie_domain: String,
        },
        Extend {
            event_id: String,
            validity_minutes: u32,
            cookie_domain: String,
        },
    }

    /// Mock State Repository for testing
    ///
    /// Returns a canned state and records every call. Writes do not change
    /// the canned state.
    pub struct MockStateRepository {
        state: SessionState,
        calls: Arc<Mutex<Vec<RepositoryCall>>>,
        fail_with: Option<String>,
    }

    impl MockStateRepository {
        pub fn new(state: SessionState) -> Self {
            Self {
                state,
                calls: Arc::new(Mutex::new(Vec::new())),
                fail_with: None,
            }
        }

        pub fn new_invalid() -> Self {
            Self::new(SessionState::Invalid)
        }

        /// Every call fails with a repository error
        pub fn new_failing(message: impl Into<String>) -> Self {
            Self {
                fail_with: Some(message.into()),
                ..Self::new_invalid()
            }
        }

        pub fn calls(&self) -> Vec<RepositoryCall> {
            self.calls.lock().unwrap().clone()
        }

        /// Calls other than reads
        pub fn writes(&self) -> Vec<RepositoryCall> {
            self.calls()
                .into_iter()
                .filter(|call| !matches!(call, RepositoryCall::GetState { .. }))
                .collect()
        }

        fn record(&self, call: RepositoryCall) -> Result<()> {
            self.calls.lock().unwrap().push(call);
            match &self.fail_with {
                Some(message) => Err(AppError::Repository(message.clone())),
                None => Ok(()),
            }
        }
    }

    impl StateRepository for MockStateRepository {
        fn get_state(&self, event_id: &str, _secret_key: &str) -> Result<SessionState> {
            self.record(RepositoryCall::GetState {
                event_id: event_id.to_string(),
            })?;
            Ok(self.state.clone())
        }

        fn store(
            &self,
            event_id: &str,
            queue_id: &str,
            is_state_extendable: bool,
            validity_minutes: u32,
            cookie_domain: &str,
            _secret_key: &str,
        ) -> Result<()> {
            self.record(RepositoryCall::Store {
                event_id: event_id.to_string(),
                queue_id: queue_id.to_string(),
                is_state_extendable,
                validity_minutes,
                cookie_domain: cookie_domain.to_string(),
            })
        }

        fn cancel_queue_cookie(&self, event_id: &str, cookie_domain: &str) -> Result<()> {
            self.record(RepositoryCall::Cancel {
                event_id: event_id.to_string(),
                cookie_domain: cookie_domain.to_string(),
            })
        }

        fn extend_queue_cookie(
            &self,
            event_id: &str,
            validity_minutes: u32,
            cookie_domain: &str,
            _secret_key: &str,
        ) -> Result<()> {
            self.record(RepositoryCall::Extend {
                event_id: event_id.to_string(),
                validity_minutes,
                cookie_domain: cookie_domain.to_string(),
            })
        }
    }
}
