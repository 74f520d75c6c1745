// Cookie-backed StateRepository implementation

use knownuser_core::domain::SessionState;
use knownuser_core::error::Result;
use knownuser_core::port::{StateRepository, TimeProvider};
use std::sync::Arc;
use tracing::debug;

use crate::cookie_jar::CookieJar;
use crate::cookie_value::StateCookieValue;

/// Admission cookie name prefix (one cookie per event)
const COOKIE_KEY_PREFIX: &str = "QueueITAccepted-SDFrts345E-V3";

/// Browser lifetime of the admission cookie; admission validity is the signed
/// `Expires` field inside the value
const COOKIE_LIFETIME_SECS: i64 = 24 * 60 * 60;

/// Expiry written when cancelling (the epoch)
const CANCELLED_EXPIRES_AT: i64 = 0;

/// Name of the admission cookie for `event_id`
pub fn cookie_key(event_id: &str) -> String {
    format!("{}_{}", COOKIE_KEY_PREFIX, event_id)
}

/// State repository storing one signed cookie per event
pub struct StateCookieRepository {
    jar: Arc<dyn CookieJar>,
    time_provider: Arc<dyn TimeProvider>,
}

impl StateCookieRepository {
    pub fn new(jar: Arc<dyn CookieJar>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self { jar, time_provider }
    }

    /// Current cookie value if it is authentic, unexpired and for `event_id`
    ///
    /// Jar failures propagate; a bad cookie is `Ok(None)`.
    fn valid_cookie(&self, event_id: &str, secret_key: &str) -> Result<Option<StateCookieValue>> {
        let Some(raw) = self.jar.get(&cookie_key(event_id))? else {
            return Ok(None);
        };

        let value = match StateCookieValue::decode(&raw) {
            Ok(value) => value,
            Err(e) => {
                debug!(event_id = %event_id, error = %e, "Unreadable admission cookie");
                return Ok(None);
            }
        };

        if !value.event_id.eq_ignore_ascii_case(event_id) {
            debug!(event_id = %event_id, cookie_event_id = %value.event_id, "Admission cookie for another event");
            return Ok(None);
        }

        if !value.is_authentic(secret_key) {
            debug!(event_id = %event_id, "Admission cookie signature mismatch");
            return Ok(None);
        }

        let now = self.time_provider.now_secs();
        if value.expires_at <= now {
            debug!(event_id = %event_id, expires_at = value.expires_at, now = now, "Admission cookie expired");
            return Ok(None);
        }

        Ok(Some(value))
    }

    fn write(
        &self,
        event_id: &str,
        queue_id: &str,
        is_cookie_extendable: bool,
        validity_minutes: u32,
        cookie_domain: &str,
        secret_key: &str,
    ) -> Result<()> {
        let now = self.time_provider.now_secs();
        let expires_at = now + i64::from(validity_minutes) * 60;
        let value = StateCookieValue::signed(
            event_id,
            queue_id,
            is_cookie_extendable,
            expires_at,
            secret_key,
        );

        self.jar.set(
            &cookie_key(event_id),
            &value.encode(),
            now + COOKIE_LIFETIME_SECS,
            cookie_domain,
        )
    }
}

impl StateRepository for StateCookieRepository {
    fn get_state(&self, event_id: &str, secret_key: &str) -> Result<SessionState> {
        Ok(match self.valid_cookie(event_id, secret_key)? {
            Some(value) => SessionState::valid(value.queue_id, value.is_cookie_extendable),
            None => SessionState::Invalid,
        })
    }

    fn store(
        &self,
        event_id: &str,
        queue_id: &str,
        is_state_extendable: bool,
        validity_minutes: u32,
        cookie_domain: &str,
        secret_key: &str,
    ) -> Result<()> {
        self.write(
            event_id,
            queue_id,
            is_state_extendable,
            validity_minutes,
            cookie_domain,
            secret_key,
        )
    }

    fn cancel_queue_cookie(&self, event_id: &str, cookie_domain: &str) -> Result<()> {
        self.jar
            .set(&cookie_key(event_id), "", CANCELLED_EXPIRES_AT, cookie_domain)
    }

    fn extend_queue_cookie(
        &self,
        event_id: &str,
        validity_minutes: u32,
        cookie_domain: &str,
        secret_key: &str,
    ) -> Result<()> {
        let Some(value) = self.valid_cookie(event_id, secret_key)? else {
            debug!(event_id = %event_id, "No valid admission cookie to extend");
            return Ok(());
        };

        self.write(
            event_id,
            &value.queue_id,
            value.is_cookie_extendable,
            validity_minutes,
            cookie_domain,
            secret_key,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookie_jar::InMemoryCookieJar;
    use knownuser_core::error::AppError;
    use knownuser_core::port::FixedTimeProvider;

    const NOW: i64 = 1_700_000_000;
    const SECRET: &str = "secret";

    fn setup(cookie_header: &str, now: i64) -> (Arc<InMemoryCookieJar>, StateCookieRepository) {
        let clock: Arc<dyn TimeProvider> = Arc::new(FixedTimeProvider(now));
        let jar = Arc::new(InMemoryCookieJar::from_cookie_header(
            cookie_header,
            clock.clone(),
        ));
        let repo = StateCookieRepository::new(jar.clone(), clock);
        (jar, repo)
    }

    fn cookie_header(value: &StateCookieValue) -> String {
        format!("{}={}", cookie_key(&value.event_id), value.encode())
    }

    #[test]
    fn test_cookie_key() {
        assert_eq!(cookie_key("evt1"), "QueueITAccepted-SDFrts345E-V3_evt1");
    }

    #[test]
    fn test_store_then_get_state() {
        let (jar, repo) = setup("", NOW);
        repo.store("evt1", "q1", true, 20, ".example.com", SECRET)
            .unwrap();

        assert_eq!(
            repo.get_state("evt1", SECRET).unwrap(),
            SessionState::valid("q1", true)
        );

        let raw = jar.get(&cookie_key("evt1")).unwrap().unwrap();
        let value = StateCookieValue::decode(&raw).unwrap();
        assert_eq!(value.expires_at, NOW + 20 * 60);

        let headers = jar.set_cookie_headers().unwrap();
        assert_eq!(headers.len(), 1);
        assert!(headers[0].contains("; Domain=example.com"));
    }

    #[test]
    fn test_missing_cookie_is_invalid() {
        let (_jar, repo) = setup("other=1", NOW);
        assert_eq!(
            repo.get_state("evt1", SECRET).unwrap(),
            SessionState::Invalid
        );
    }

    #[test]
    fn test_expired_cookie_is_invalid() {
        let value = StateCookieValue::signed("evt1", "q1", false, NOW, SECRET);
        let (_jar, repo) = setup(&cookie_header(&value), NOW);

        assert!(!repo.get_state("evt1", SECRET).unwrap().is_valid());
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let value = StateCookieValue::signed("evt1", "q1", false, NOW + 60, "other");
        let (_jar, repo) = setup(&cookie_header(&value), NOW);

        assert!(!repo.get_state("evt1", SECRET).unwrap().is_valid());
    }

    #[test]
    fn test_event_id_compared_case_insensitively() {
        let value = StateCookieValue::signed("EVT1", "q1", false, NOW + 60, SECRET);
        let header = format!("{}={}", cookie_key("evt1"), value.encode());
        let (_jar, repo) = setup(&header, NOW);

        assert!(repo.get_state("evt1", SECRET).unwrap().is_valid());
    }

    #[test]
    fn test_cookie_of_other_event_is_invalid() {
        let value = StateCookieValue::signed("evt2", "q1", false, NOW + 60, SECRET);
        let header = format!("{}={}", cookie_key("evt1"), value.encode());
        let (_jar, repo) = setup(&header, NOW);

        assert!(!repo.get_state("evt1", SECRET).unwrap().is_valid());
    }

    #[test]
    fn test_garbage_cookie_is_invalid() {
        let header = format!("{}=garbage", cookie_key("evt1"));
        let (_jar, repo) = setup(&header, NOW);

        assert!(!repo.get_state("evt1", SECRET).unwrap().is_valid());
    }

    #[test]
    fn test_cancel_removes_state() {
        let value = StateCookieValue::signed("evt1", "q1", false, NOW + 60, SECRET);
        let (jar, repo) = setup(&cookie_header(&value), NOW);

        repo.cancel_queue_cookie("evt1", ".example.com").unwrap();

        assert!(!repo.get_state("evt1", SECRET).unwrap().is_valid());
        let headers = jar.set_cookie_headers().unwrap();
        assert!(headers[0].starts_with("QueueITAccepted-SDFrts345E-V3_evt1=; Path=/"));
        assert!(headers[0].contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
    }

    #[test]
    fn test_extend_refreshes_valid_cookie() {
        let value = StateCookieValue::signed("evt1", "q1", true, NOW + 60, SECRET);
        let (jar, repo) = setup(&cookie_header(&value), NOW);

        repo.extend_queue_cookie("evt1", 30, "", SECRET).unwrap();

        let raw = jar.get(&cookie_key("evt1")).unwrap().unwrap();
        let extended = StateCookieValue::decode(&raw).unwrap();
        assert_eq!(extended.expires_at, NOW + 30 * 60);
        assert_eq!(extended.queue_id, "q1");
        assert!(extended.is_cookie_extendable);
        assert!(extended.is_authentic(SECRET));
    }

    #[test]
    fn test_extend_ignores_invalid_cookie() {
        let value = StateCookieValue::signed("evt1", "q1", true, NOW - 60, SECRET);
        let (jar, repo) = setup(&cookie_header(&value), NOW);

        repo.extend_queue_cookie("evt1", 30, "", SECRET).unwrap();

        assert!(jar.set_cookie_headers().unwrap().is_empty());
    }

    #[test]
    fn test_delimiters_in_queue_id_survive_next_request() {
        let (jar, repo) = setup("", NOW);
        repo.store("evt1", "q;1 x,y", false, 20, "", SECRET).unwrap();

        let (_next_jar, next) = setup(&jar.cookie_header().unwrap(), NOW + 60);
        assert_eq!(
            next.get_state("evt1", SECRET).unwrap(),
            SessionState::valid("q;1 x,y", false)
        );
    }

    struct BrokenJar;

    impl CookieJar for BrokenJar {
        fn get(&self, _name: &str) -> Result<Option<String>> {
            Err(AppError::Repository("cookie jar lock poisoned".to_string()))
        }

        fn set(&self, _name: &str, _value: &str, _expires_at: i64, _domain: &str) -> Result<()> {
            Err(AppError::Repository("cookie jar lock poisoned".to_string()))
        }
    }

    #[test]
    fn test_jar_failure_is_not_an_invalid_state() {
        let repo = StateCookieRepository::new(Arc::new(BrokenJar), Arc::new(FixedTimeProvider(NOW)));

        assert!(matches!(
            repo.get_state("evt1", SECRET),
            Err(AppError::Repository(_))
        ));
        assert!(matches!(
            repo.extend_queue_cookie("evt1", 20, "", SECRET),
            Err(AppError::Repository(_))
        ));
    }
}
