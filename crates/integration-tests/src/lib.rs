//! Shared wiring for the end-to-end admission tests
//!
//! One `Visit` is one request/response cycle: a fresh cookie jar seeded from
//! the previous response's cookies, the cookie repository on top of it, and
//! the admission service on a frozen clock.

use std::sync::Arc;

use knownuser_core::application::admission::signature::sign_token;
use knownuser_core::application::AdmissionService;
use knownuser_core::domain::{QueueEventConfig, TokenSyntax, UnsignedToken};
use knownuser_core::port::{FixedTimeProvider, TimeProvider};
use knownuser_infra_cookie::{InMemoryCookieJar, StateCookieRepository};

pub const CUSTOMER_ID: &str = "cust1";
pub const SECRET_KEY: &str = "integration-secret-key";
pub const EVENT_ID: &str = "evt1";
pub const QUEUE_DOMAIN: &str = "queue.example.com";
pub const TARGET_URL: &str = "https://shop.example.com/checkout?step=1";

pub fn event_config() -> QueueEventConfig {
    QueueEventConfig::new(EVENT_ID, QUEUE_DOMAIN, 20)
        .with_version(2)
        .with_cookie_domain(".example.com")
}

pub fn signed_token(queue_id: &str, expires_at: i64, extendable: bool) -> String {
    let unsigned = UnsignedToken::new(EVENT_ID, queue_id, expires_at)
        .with_extendable_cookie(extendable);
    sign_token(&unsigned, TokenSyntax::NATIVE, SECRET_KEY).expect("token fields are valid")
}

pub struct Visit {
    pub service: AdmissionService,
    pub jar: Arc<InMemoryCookieJar>,
}

impl Visit {
    /// Request at `now` carrying `cookie_header`
    pub fn new(cookie_header: &str, now: i64) -> Self {
        let clock: Arc<dyn TimeProvider> = Arc::new(FixedTimeProvider(now));
        let jar = Arc::new(InMemoryCookieJar::from_cookie_header(
            cookie_header,
            clock.clone(),
        ));
        let repo = Arc::new(StateCookieRepository::new(jar.clone(), clock.clone()));

        Self {
            service: AdmissionService::new(repo, clock),
            jar,
        }
    }

    /// Cookie header the browser sends on the next request
    pub fn next_cookie_header(&self) -> String {
        self.jar.cookie_header().expect("jar lock")
    }

    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.jar.set_cookie_headers().expect("jar lock")
    }
}
