// Validate Queue Request Use Case

use tracing::{debug, info};

use super::{redirect, signature};
use crate::domain::{
    ActionType, QueueEventConfig, QueueUrlParams, RedirectKind, RequestValidationResult,
    TokenRejection,
};
use crate::error::Result;
use crate::port::{StateRepository, TimeProvider};

/// Queue validation request (borrowed from the incoming HTTP request)
#[derive(Debug, Clone, Copy)]
pub struct QueueRequest<'a> {
    /// Page the visitor asked for; sent as `t` on redirects when non-empty
    pub target_url: &'a str,
    /// Token the queue service appended to the URL, if any
    pub token: Option<&'a str>,
    pub config: &'a QueueEventConfig,
    pub customer_id: &'a str,
    pub secret_key: &'a str,
}

/// Execute queue validation
///
/// 1. A valid stored state lets the visitor through (refreshing it when both
///    the state and the config allow extension).
/// 2. Otherwise a token is checked (hash, event id, expiry, in that order)
///    and stored on success.
/// 3. Otherwise the visitor is sent to the queue.
///
/// Token rejections come back as error-page redirects; only repository
/// failures are returned as `Err`.
pub fn execute(
    state_repo: &dyn StateRepository,
    time_provider: &dyn TimeProvider,
    req: QueueRequest<'_>,
) -> Result<RequestValidationResult> {
    let config = req.config;
    let state = state_repo.get_state(&config.event_id, req.secret_key)?;

    if let Some(queue_id) = state.queue_id() {
        if state.is_state_extendable() && config.extend_cookie_validity {
            state_repo.store(
                &config.event_id,
                queue_id,
                true,
                config.cookie_validity_minute,
                config.cookie_domain_or_empty(),
                req.secret_key,
            )?;
            debug!(event_id = %config.event_id, queue_id = %queue_id, "Extended session state");
        }

        debug!(event_id = %config.event_id, queue_id = %queue_id, "Valid session state, proceeding");
        return Ok(RequestValidationResult::proceed(
            ActionType::Queue,
            &config.event_id,
            Some(queue_id.to_string()),
        ));
    }

    match req.token.filter(|token| !token.is_empty()) {
        Some(token) => validate_token(state_repo, time_provider, &req, token),
        None => {
            let url = redirect::queue_url(config, req.customer_id, req.target_url);
            info!(event_id = %config.event_id, "No session state or token, redirecting to queue");
            Ok(RequestValidationResult::redirect(
                ActionType::Queue,
                &config.event_id,
                None,
                RedirectKind::Queue,
                url,
            ))
        }
    }
}

fn validate_token(
    state_repo: &dyn StateRepository,
    time_provider: &dyn TimeProvider,
    req: &QueueRequest<'_>,
    token: &str,
) -> Result<RequestValidationResult> {
    let config = req.config;
    let now = time_provider.now_secs();

    let params = match check_token(token, &config.event_id, req.secret_key, now) {
        Ok(params) => params,
        Err(rejection) => {
            info!(
                event_id = %config.event_id,
                error_code = rejection.error_code(),
                reason = %rejection,
                "Queue token rejected"
            );
            let url = redirect::error_url(
                config,
                req.customer_id,
                req.target_url,
                token,
                rejection.error_code(),
                now,
            );
            return Ok(RequestValidationResult::redirect(
                ActionType::Queue,
                &config.event_id,
                None,
                RedirectKind::Error(rejection),
                url,
            ));
        }
    };

    state_repo.store(
        &config.event_id,
        &params.queue_id,
        params.extendable_cookie,
        params
            .cookie_validity_minute
            .unwrap_or(config.cookie_validity_minute),
        config.cookie_domain_or_empty(),
        req.secret_key,
    )?;

    info!(
        event_id = %config.event_id,
        queue_id = %params.queue_id,
        extendable = params.extendable_cookie,
        "Queue token accepted"
    );
    Ok(RequestValidationResult::proceed(
        ActionType::Queue,
        &config.event_id,
        Some(params.queue_id),
    ))
}

/// Parse and check a token; the first failing check wins
fn check_token(
    token: &str,
    event_id: &str,
    secret_key: &str,
    now: i64,
) -> std::result::Result<QueueUrlParams, TokenRejection> {
    let params = QueueUrlParams::parse(token)?;

    if !signature::verify_hash(
        &params.queue_it_token_without_hash,
        &params.hash_code,
        secret_key,
    ) {
        return Err(TokenRejection::SignatureMismatch);
    }

    if !params.event_id.eq_ignore_ascii_case(event_id) {
        return Err(TokenRejection::EventMismatch {
            expected: event_id.to_string(),
            found: params.event_id,
        });
    }

    if params.time_stamp < now {
        return Err(TokenRejection::Expired {
            expired_at: params.time_stamp,
            now,
        });
    }

    Ok(params)
}
