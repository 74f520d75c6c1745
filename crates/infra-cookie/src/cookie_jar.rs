// Cookie Jar - minimal cookie read/write interface
// reason: the HTTP layer owns real cookie plumbing; the repository only needs get/set

use cookie::Cookie;
use knownuser_core::error::{AppError, Result};
use knownuser_core::port::TimeProvider;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use time::OffsetDateTime;
use tracing::debug;

/// Cookie access for the state repository
pub trait CookieJar: Send + Sync {
    /// Value of a cookie sent with the request (or written since)
    fn get(&self, name: &str) -> Result<Option<String>>;

    /// Write a cookie; an `expires_at` in the past deletes it
    ///
    /// # Arguments
    /// * `expires_at` - Unix seconds
    /// * `domain` - Cookie domain (empty for host-only)
    fn set(&self, name: &str, value: &str, expires_at: i64, domain: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
struct SetCookie {
    value: String,
    expires_at: i64,
    domain: String,
}

#[derive(Default)]
struct JarState {
    /// Decoded cookies visible to `get`
    current: BTreeMap<String, String>,
    /// Writes to send back, last write per name wins
    pending: BTreeMap<String, SetCookie>,
}

/// In-memory cookie jar for one request/response cycle
///
/// Seeded from the request's `Cookie` header; writes are collected and
/// rendered as percent-encoded `Set-Cookie` header values.
pub struct InMemoryCookieJar {
    state: Mutex<JarState>,
    time_provider: Arc<dyn TimeProvider>,
}

impl InMemoryCookieJar {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            state: Mutex::new(JarState::default()),
            time_provider,
        }
    }

    /// Seed the jar from a `Cookie` request header (`a=1; b=2`)
    ///
    /// Unparseable pairs are skipped.
    pub fn from_cookie_header(header: &str, time_provider: Arc<dyn TimeProvider>) -> Self {
        let current = Cookie::split_parse_encoded(header)
            .filter_map(|parsed| match parsed {
                Ok(cookie) => Some((cookie.name().to_string(), cookie.value().to_string())),
                Err(e) => {
                    debug!(error = %e, "Skipping malformed request cookie");
                    None
                }
            })
            .collect();

        Self {
            state: Mutex::new(JarState {
                current,
                pending: BTreeMap::new(),
            }),
            time_provider,
        }
    }

    /// `Set-Cookie` header values for every cookie written so far
    pub fn set_cookie_headers(&self) -> Result<Vec<String>> {
        let state = self.lock()?;
        Ok(state
            .pending
            .iter()
            .map(|(name, cookie)| render_set_cookie(name, cookie))
            .collect())
    }

    /// `Cookie` header a browser would send on the next request
    pub fn cookie_header(&self) -> Result<String> {
        let state = self.lock()?;
        Ok(state
            .current
            .iter()
            .map(|(name, value)| Cookie::new(name.as_str(), value.as_str()).encoded().to_string())
            .collect::<Vec<_>>()
            .join("; "))
    }

    fn lock(&self) -> Result<MutexGuard<'_, JarState>> {
        self.state
            .lock()
            .map_err(|e| AppError::Repository(format!("cookie jar lock poisoned: {}", e)))
    }
}

impl CookieJar for InMemoryCookieJar {
    fn get(&self, name: &str) -> Result<Option<String>> {
        Ok(self.lock()?.current.get(name).cloned())
    }

    fn set(&self, name: &str, value: &str, expires_at: i64, domain: &str) -> Result<()> {
        let now = self.time_provider.now_secs();
        let mut state = self.lock()?;

        if expires_at <= now {
            state.current.remove(name);
        } else {
            state.current.insert(name.to_string(), value.to_string());
        }

        state.pending.insert(
            name.to_string(),
            SetCookie {
                value: value.to_string(),
                expires_at,
                domain: domain.to_string(),
            },
        );

        debug!(cookie = %name, expires_at = expires_at, domain = %domain, "Cookie written");
        Ok(())
    }
}

fn render_set_cookie(name: &str, cookie: &SetCookie) -> String {
    let mut builder = Cookie::build((name, cookie.value.as_str())).path("/");

    if !cookie.domain.is_empty() {
        builder = builder.domain(cookie.domain.as_str());
    }
    if let Ok(expires) = OffsetDateTime::from_unix_timestamp(cookie.expires_at) {
        builder = builder.expires(expires);
    }

    builder.build().encoded().to_string()
}
