//! Queue token wire format
//!
//! The queue service appends a signed token to the target URL once a visitor
//! leaves the queue. A token is a list of key/value groups ending with the
//! hash group, e.g.
//!
//! ```text
//! e_evt1~q_4f3c9a~ts_1700003600~ce_true~cv_20~h_9b1e...
//! ```
//!
//! Everything before the hash group is the signed payload. It is kept
//! verbatim: re-serializing the groups would change the bytes and break
//! signature verification.

use serde::Serialize;
use thiserror::Error;

use super::error::{DomainError, Result};

pub const EVENT_ID_KEY: &str = "e";
pub const QUEUE_ID_KEY: &str = "q";
pub const TIMESTAMP_KEY: &str = "ts";
pub const EXTENDABLE_COOKIE_KEY: &str = "ce";
pub const COOKIE_VALIDITY_MINUTE_KEY: &str = "cv";
pub const HASH_KEY: &str = "h";

/// Why a token was refused
///
/// Rejections are decisions, not failures: the engine turns each one into a
/// redirect to the queue service's error page.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenRejection {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token hash does not match")]
    SignatureMismatch,

    #[error("token event id {found} does not match {expected}")]
    EventMismatch { expected: String, found: String },

    #[error("token expired at {expired_at} (now {now})")]
    Expired { expired_at: i64, now: i64 },
}

impl TokenRejection {
    /// Path segment of the error page (`error/<code>/`)
    ///
    /// A malformed token can never carry a valid signature, so it shares the
    /// `hash` code.
    pub fn error_code(&self) -> &'static str {
        match self {
            TokenRejection::Malformed(_) | TokenRejection::SignatureMismatch => "hash",
            TokenRejection::EventMismatch { .. } => "eventid",
            TokenRejection::Expired { .. } => "timestamp",
        }
    }
}

/// Delimiters of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSyntax {
    pub group: char,
    pub pair: char,
}

impl TokenSyntax {
    /// `e_evt1~q_abc~...~h_...` as issued by the queue service
    pub const NATIVE: TokenSyntax = TokenSyntax {
        group: '~',
        pair: '_',
    };
    /// `e=evt1|q=abc|...|h=...`
    pub const PIPE: TokenSyntax = TokenSyntax {
        group: '|',
        pair: '=',
    };
    /// `e=evt1&q=abc&...&h=...`
    pub const QUERY: TokenSyntax = TokenSyntax {
        group: '&',
        pair: '=',
    };

    /// Checked in order; QUERY is also the fallback
    const DETECTION_ORDER: [TokenSyntax; 3] = [Self::NATIVE, Self::PIPE, Self::QUERY];

    pub fn detect(token: &str) -> Self {
        Self::DETECTION_ORDER
            .into_iter()
            .find(|syntax| token.contains(syntax.group))
            .unwrap_or(Self::QUERY)
    }

    /// Whether `c` in a field would change how a token in this syntax parses:
    /// its own delimiters, or the group delimiter of a syntax detected first
    pub fn is_reserved(self, c: char) -> bool {
        c == self.pair
            || Self::DETECTION_ORDER
                .iter()
                .take_while(|syntax| **syntax != self)
                .chain(std::iter::once(&self))
                .any(|syntax| syntax.group == c)
    }
}

/// Fields extracted from a queue token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueUrlParams {
    pub event_id: String,
    pub queue_id: String,
    pub hash_code: String,
    /// Exact bytes covered by the hash
    pub queue_it_token_without_hash: String,
    /// Raw token as received
    pub queue_it_token: String,
    /// Expiry boundary in Unix seconds (not the issue time)
    pub time_stamp: i64,
    pub extendable_cookie: bool,
    pub cookie_validity_minute: Option<u32>,
}

impl QueueUrlParams {
    /// Parse a raw token
    ///
    /// Fails with `TokenRejection::Malformed` when the hash group is not the
    /// last group or when `e`, `q`, `ts` or `h` is missing. A `ts` that is
    /// present but not numeric reads as 0 (already expired); a non-numeric
    /// or zero `cv` is ignored.
    pub fn parse(token: &str) -> std::result::Result<Self, TokenRejection> {
        let syntax = TokenSyntax::detect(token);

        let (payload, hash_group) = token
            .rsplit_once(syntax.group)
            .ok_or_else(|| TokenRejection::Malformed("no hash group".to_string()))?;

        let hash_code = hash_group
            .strip_prefix(HASH_KEY)
            .and_then(|rest| rest.strip_prefix(syntax.pair))
            .filter(|hash| !hash.is_empty())
            .ok_or_else(|| TokenRejection::Malformed("hash must be the last group".to_string()))?;

        let mut event_id = None;
        let mut queue_id = None;
        let mut time_stamp = None;
        let mut extendable_cookie = false;
        let mut cookie_validity_minute = None;

        for group in payload.split(syntax.group) {
            let Some((key, value)) = group.split_once(syntax.pair) else {
                continue;
            };

            match key {
                EVENT_ID_KEY => event_id = Some(value),
                QUEUE_ID_KEY => queue_id = Some(value),
                TIMESTAMP_KEY => time_stamp = Some(value.parse::<i64>().unwrap_or(0)),
                EXTENDABLE_COOKIE_KEY => extendable_cookie = value.eq_ignore_ascii_case("true"),
                COOKIE_VALIDITY_MINUTE_KEY => {
                    cookie_validity_minute = value.parse::<u32>().ok().filter(|m| *m > 0)
                }
                _ => {}
            }
        }

        Ok(Self {
            event_id: required(EVENT_ID_KEY, event_id)?,
            queue_id: required(QUEUE_ID_KEY, queue_id)?,
            hash_code: hash_code.to_string(),
            queue_it_token_without_hash: payload.to_string(),
            queue_it_token: token.to_string(),
            time_stamp: time_stamp
                .ok_or_else(|| TokenRejection::Malformed(format!("missing {}", TIMESTAMP_KEY)))?,
            extendable_cookie,
            cookie_validity_minute,
        })
    }
}

fn required(key: &str, value: Option<&str>) -> std::result::Result<String, TokenRejection> {
    value
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| TokenRejection::Malformed(format!("missing {}", key)))
}

/// Token fields before signing
///
/// Used to mint tokens for local testing; the queue service issues the real
/// ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedToken {
    pub event_id: String,
    pub queue_id: String,
    pub expires_at: i64,
    pub extendable_cookie: bool,
    pub cookie_validity_minute: Option<u32>,
}

impl UnsignedToken {
    pub fn new(event_id: impl Into<String>, queue_id: impl Into<String>, expires_at: i64) -> Self {
        Self {
            event_id: event_id.into(),
            queue_id: queue_id.into(),
            expires_at,
            extendable_cookie: false,
            cookie_validity_minute: None,
        }
    }

    pub fn with_extendable_cookie(mut self, extendable: bool) -> Self {
        self.extendable_cookie = extendable;
        self
    }

    pub fn with_cookie_validity_minute(mut self, minutes: u32) -> Self {
        self.cookie_validity_minute = Some(minutes);
        self
    }

    /// Ids must not contain reserved characters or the token would not parse back
    pub fn validate(&self, syntax: TokenSyntax) -> Result<()> {
        for (key, value) in [
            (EVENT_ID_KEY, &self.event_id),
            (QUEUE_ID_KEY, &self.queue_id),
        ] {
            if value.is_empty() {
                return Err(DomainError::ValidationError(format!(
                    "token field {} cannot be empty",
                    key
                )));
            }
            if value.chars().any(|c| syntax.is_reserved(c)) {
                return Err(DomainError::ValidationError(format!(
                    "token field {} contains a delimiter",
                    key
                )));
            }
        }
        Ok(())
    }

    /// Signing payload in the given syntax
    pub fn payload(&self, syntax: TokenSyntax) -> String {
        let mut groups = vec![
            format!("{}{}{}", EVENT_ID_KEY, syntax.pair, self.event_id),
            format!("{}{}{}", QUEUE_ID_KEY, syntax.pair, self.queue_id),
            format!("{}{}{}", TIMESTAMP_KEY, syntax.pair, self.expires_at),
            format!(
                "{}{}{}",
                EXTENDABLE_COOKIE_KEY, syntax.pair, self.extendable_cookie
            ),
        ];
        if let Some(minutes) = self.cookie_validity_minute {
            groups.push(format!(
                "{}{}{}",
                COOKIE_VALIDITY_MINUTE_KEY, syntax.pair, minutes
            ));
        }
        groups.join(&syntax.group.to_string())
    }
}
