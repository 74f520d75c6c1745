// Admission Service - Core use cases for queue admission

pub mod cancel;
pub mod constants;
pub mod queue;
pub mod redirect;
pub mod signature;

pub use queue::QueueRequest;

use crate::domain::{CancelEventConfig, RequestValidationResult};
use crate::error::Result;
use crate::port::{StateRepository, TimeProvider};
use std::sync::Arc;

/// Admission Service
///
/// Stateless apart from the injected repository; one instance can serve every
/// request.
pub struct AdmissionService {
    state_repo: Arc<dyn StateRepository>,
    time_provider: Arc<dyn TimeProvider>,
}

impl AdmissionService {
    pub fn new(state_repo: Arc<dyn StateRepository>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            state_repo,
            time_provider,
        }
    }

    /// Decide whether a visitor may see a queue-protected page
    pub fn validate_queue_request(&self, req: QueueRequest<'_>) -> Result<RequestValidationResult> {
        req.config.validate()?;
        queue::execute(self.state_repo.as_ref(), self.time_provider.as_ref(), req)
    }

    /// Release the visitor's admission for an event
    pub fn validate_cancel_request(
        &self,
        target_url: &str,
        config: &CancelEventConfig,
        customer_id: &str,
        secret_key: &str,
    ) -> Result<RequestValidationResult> {
        config.validate()?;
        cancel::execute(
            self.state_repo.as_ref(),
            target_url,
            config,
            customer_id,
            secret_key,
        )
    }

    /// Refresh the admission window of an event (repository decides validity)
    pub fn extend_queue_cookie(
        &self,
        event_id: &str,
        cookie_validity_minute: u32,
        cookie_domain: &str,
        secret_key: &str,
    ) -> Result<()> {
        self.state_repo
            .extend_queue_cookie(event_id, cookie_validity_minute, cookie_domain, secret_key)
    }
}
