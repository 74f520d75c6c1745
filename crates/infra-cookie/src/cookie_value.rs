// Admission cookie value codec
//
// EventId=<e>&QueueId=<q>&IsCookieExtendable=<true|false>&Expires=<unix>&Hash=<hex>
// Hash covers e + q + extendable + expires, concatenated without separators.

use knownuser_core::application::admission::signature::{compute_hash, verify_hash};
use thiserror::Error;

const EVENT_ID_KEY: &str = "EventId";
const QUEUE_ID_KEY: &str = "QueueId";
const EXTENDABLE_KEY: &str = "IsCookieExtendable";
const EXPIRES_KEY: &str = "Expires";
const HASH_KEY: &str = "Hash";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CookieValueError {
    #[error("Missing cookie field: {0}")]
    MissingField(&'static str),

    #[error("Invalid expiry: {0}")]
    InvalidExpiry(String),
}

/// Decoded admission cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateCookieValue {
    pub event_id: String,
    pub queue_id: String,
    pub is_cookie_extendable: bool,
    pub expires_at: i64,
    pub hash: String,
}

impl StateCookieValue {
    /// Build and sign a cookie value
    pub fn signed(
        event_id: &str,
        queue_id: &str,
        is_cookie_extendable: bool,
        expires_at: i64,
        secret_key: &str,
    ) -> Self {
        let hash = compute_hash(
            &signing_payload(event_id, queue_id, is_cookie_extendable, expires_at),
            secret_key,
        );
        Self {
            event_id: event_id.to_string(),
            queue_id: queue_id.to_string(),
            is_cookie_extendable,
            expires_at,
            hash,
        }
    }

    pub fn decode(raw: &str) -> Result<Self, CookieValueError> {
        let mut event_id = None;
        let mut queue_id = None;
        let mut extendable = None;
        let mut expires = None;
        let mut hash = None;

        for (key, value) in raw.split('&').filter_map(|pair| pair.split_once('=')) {
            match key {
                EVENT_ID_KEY => event_id = Some(value),
                QUEUE_ID_KEY => queue_id = Some(value),
                EXTENDABLE_KEY => extendable = Some(value),
                EXPIRES_KEY => expires = Some(value),
                HASH_KEY => hash = Some(value),
                _ => {}
            }
        }

        let expires = expires.ok_or(CookieValueError::MissingField(EXPIRES_KEY))?;
        Ok(Self {
            event_id: event_id
                .ok_or(CookieValueError::MissingField(EVENT_ID_KEY))?
                .to_string(),
            queue_id: queue_id
                .filter(|q| !q.is_empty())
                .ok_or(CookieValueError::MissingField(QUEUE_ID_KEY))?
                .to_string(),
            is_cookie_extendable: extendable
                .ok_or(CookieValueError::MissingField(EXTENDABLE_KEY))?
                .eq_ignore_ascii_case("true"),
            expires_at: expires
                .parse()
                .map_err(|_| CookieValueError::InvalidExpiry(expires.to_string()))?,
            hash: hash
                .ok_or(CookieValueError::MissingField(HASH_KEY))?
                .to_string(),
        })
    }

    pub fn encode(&self) -> String {
        format!(
            "{}={}&{}={}&{}={}&{}={}&{}={}",
            EVENT_ID_KEY,
            self.event_id,
            QUEUE_ID_KEY,
            self.queue_id,
            EXTENDABLE_KEY,
            self.is_cookie_extendable,
            EXPIRES_KEY,
            self.expires_at,
            HASH_KEY,
            self.hash
        )
    }

    /// Signature matches the fields under `secret_key`
    pub fn is_authentic(&self, secret_key: &str) -> bool {
        verify_hash(
            &signing_payload(
                &self.event_id,
                &self.queue_id,
                self.is_cookie_extendable,
                self.expires_at,
            ),
            &self.hash,
            secret_key,
        )
    }
}

fn signing_payload(event_id: &str, queue_id: &str, extendable: bool, expires_at: i64) -> String {
    format!("{}{}{}{}", event_id, queue_id, extendable, expires_at)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let value = StateCookieValue {
            event_id: "evt1".to_string(),
            queue_id: "q1".to_string(),
            is_cookie_extendable: true,
            expires_at: 1700000000,
            hash: "abc".to_string(),
        };
        assert_eq!(
            value.encode(),
            "EventId=evt1&QueueId=q1&IsCookieExtendable=true&Expires=1700000000&Hash=abc"
        );
    }

    #[test]
    fn test_signed_value_decodes_and_verifies() {
        let value = StateCookieValue::signed("evt1", "q1", false, 1700000000, "secret");
        let decoded = StateCookieValue::decode(&value.encode()).unwrap();

        assert_eq!(decoded, value);
        assert!(decoded.is_authentic("secret"));
        assert!(!decoded.is_authentic("other"));
    }

    #[test]
    fn test_hash_covers_expiry() {
        let value = StateCookieValue::signed("evt1", "q1", false, 1700000000, "secret");
        let forged = value.encode().replace("Expires=1700000000", "Expires=1800000000");

        let decoded = StateCookieValue::decode(&forged).unwrap();
        assert!(!decoded.is_authentic("secret"));
    }

    #[test]
    fn test_decode_missing_fields() {
        assert_eq!(
            StateCookieValue::decode("EventId=evt1&QueueId=q1"),
            Err(CookieValueError::MissingField("Expires"))
        );
        assert_eq!(
            StateCookieValue::decode(
                "EventId=evt1&QueueId=&IsCookieExtendable=true&Expires=1&Hash=x"
            ),
            Err(CookieValueError::MissingField("QueueId"))
        );
        assert!(matches!(
            StateCookieValue::decode(
                "EventId=evt1&QueueId=q1&IsCookieExtendable=true&Expires=soon&Hash=x"
            ),
            Err(CookieValueError::InvalidExpiry(_))
        ));
    }
}
