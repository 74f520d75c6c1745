// Validate Cancel Request Use Case

use tracing::{debug, info};

use super::redirect;
use crate::domain::{ActionType, CancelEventConfig, RedirectKind, RequestValidationResult};
use crate::error::Result;
use crate::port::StateRepository;

/// Execute cancel validation
///
/// A valid admission is dropped and the visitor is sent to the queue
/// service's cancel page; with nothing to cancel the request proceeds.
pub fn execute(
    state_repo: &dyn StateRepository,
    target_url: &str,
    config: &CancelEventConfig,
    customer_id: &str,
    secret_key: &str,
) -> Result<RequestValidationResult> {
    let state = state_repo.get_state(&config.event_id, secret_key)?;

    let Some(queue_id) = state.queue_id() else {
        debug!(event_id = %config.event_id, "No session state to cancel, proceeding");
        return Ok(RequestValidationResult::proceed(
            ActionType::Cancel,
            &config.event_id,
            None,
        ));
    };

    state_repo.cancel_queue_cookie(&config.event_id, config.cookie_domain_or_empty())?;

    let url = redirect::cancel_url(config, customer_id, target_url);
    info!(event_id = %config.event_id, queue_id = %queue_id, "Session state cancelled");

    Ok(RequestValidationResult::redirect(
        ActionType::Cancel,
        &config.event_id,
        Some(queue_id.to_string()),
        RedirectKind::Cancel,
        url,
    ))
}
