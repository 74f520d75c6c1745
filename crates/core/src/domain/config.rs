// Event Configuration Domain Model

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Queue event configuration
///
/// Built by the caller once per request and never mutated during validation.
/// Field names follow the integration configuration JSON (camelCase).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEventConfig {
    pub event_id: String,
    pub version: Option<i64>,
    pub culture: Option<String>,
    pub layout_name: Option<String>,
    pub queue_domain: String,
    pub cookie_domain: Option<String>,
    pub cookie_validity_minute: u32,
    #[serde(default)]
    pub extend_cookie_validity: bool,
}

impl QueueEventConfig {
    /// Create a config with only the required fields set
    ///
    /// Trailing slashes are stripped from `queue_domain`.
    pub fn new(
        event_id: impl Into<String>,
        queue_domain: impl Into<String>,
        cookie_validity_minute: u32,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            version: None,
            culture: None,
            layout_name: None,
            queue_domain: normalize_domain(queue_domain.into()),
            cookie_domain: None,
            cookie_validity_minute,
            extend_cookie_validity: false,
        }
    }

    pub fn with_version(mut self, version: i64) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_culture(mut self, culture: impl Into<String>) -> Self {
        self.culture = Some(culture.into());
        self
    }

    pub fn with_layout_name(mut self, layout_name: impl Into<String>) -> Self {
        self.layout_name = Some(layout_name.into());
        self
    }

    pub fn with_cookie_domain(mut self, cookie_domain: impl Into<String>) -> Self {
        self.cookie_domain = Some(cookie_domain.into());
        self
    }

    pub fn with_extend_cookie_validity(mut self, extend: bool) -> Self {
        self.extend_cookie_validity = extend;
        self
    }

    /// Cookie domain to hand to the repository (empty when unset)
    pub fn cookie_domain_or_empty(&self) -> &str {
        self.cookie_domain.as_deref().unwrap_or("")
    }

    /// Reject configs the queue service could never match
    pub fn validate(&self) -> Result<()> {
        require_non_empty("eventId", &self.event_id)?;
        require_non_empty("queueDomain", &self.queue_domain)?;

        if self.cookie_validity_minute == 0 {
            return Err(DomainError::InvalidConfig(
                "cookieValidityMinute must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Cancel event configuration (subset of the queue config)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelEventConfig {
    pub event_id: String,
    pub version: Option<i64>,
    pub queue_domain: String,
    pub cookie_domain: Option<String>,
}

impl CancelEventConfig {
    pub fn new(event_id: impl Into<String>, queue_domain: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            version: None,
            queue_domain: normalize_domain(queue_domain.into()),
            cookie_domain: None,
        }
    }

    pub fn with_version(mut self, version: i64) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_cookie_domain(mut self, cookie_domain: impl Into<String>) -> Self {
        self.cookie_domain = Some(cookie_domain.into());
        self
    }

    pub fn cookie_domain_or_empty(&self) -> &str {
        self.cookie_domain.as_deref().unwrap_or("")
    }

    pub fn validate(&self) -> Result<()> {
        require_non_empty("eventId", &self.event_id)?;
        require_non_empty("queueDomain", &self.queue_domain)
    }
}

impl From<&QueueEventConfig> for CancelEventConfig {
    fn from(config: &QueueEventConfig) -> Self {
        Self {
            event_id: config.event_id.clone(),
            version: config.version,
            queue_domain: config.queue_domain.clone(),
            cookie_domain: config.cookie_domain.clone(),
        }
    }
}

fn normalize_domain(domain: String) -> String {
    domain.trim_end_matches('/').to_string()
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DomainError::InvalidConfig(format!("{} cannot be empty", field)));
    }
    Ok(())
}
