//! Redirect URL construction
//!
//! Field order and names are read by the queue service and must not change:
//! `c, e, ver, cver, cid, l` then `queueittoken, ts, t` (error page) or `r`
//! (cancel page).

use url::form_urlencoded;

use super::constants::{sdk_version_tag, MISSING_CONFIG_VERSION, QUEUE_IT_TOKEN_PARAM};
use crate::domain::{CancelEventConfig, QueueEventConfig};

/// Queue entry page: `https://<queueDomain>/?<query>[&t=<target>]`
pub fn queue_url(config: &QueueEventConfig, customer_id: &str, target_url: &str) -> String {
    let mut query = query_string(
        customer_id,
        &config.event_id,
        config.version,
        config.culture.as_deref(),
        config.layout_name.as_deref(),
    );
    push_optional(&mut query, "t", target_url);

    format!(
        "https://{}/?{}",
        config.queue_domain.trim_end_matches('/'),
        query
    )
}

/// Error page: `https://<domain>/error/<code>/?<query>&queueittoken=..&ts=..[&t=..]`
///
/// The raw token is passed back as received so the queue service can inspect
/// exactly what it issued.
pub fn error_url(
    config: &QueueEventConfig,
    customer_id: &str,
    target_url: &str,
    raw_token: &str,
    error_code: &str,
    now_secs: i64,
) -> String {
    let mut query = query_string(
        customer_id,
        &config.event_id,
        config.version,
        config.culture.as_deref(),
        config.layout_name.as_deref(),
    );
    query.push_str(&format!("&{}={}", QUEUE_IT_TOKEN_PARAM, raw_token));
    query.push_str(&format!("&ts={}", now_secs));
    push_optional(&mut query, "t", target_url);

    format!(
        "https://{}error/{}/?{}",
        domain_alias(&config.queue_domain),
        error_code,
        query
    )
}

/// Cancel page: `https://<domain>/cancel/<customer>/<event>/?<query>[&r=<target>]`
///
/// Culture and layout are never sent on cancel.
pub fn cancel_url(config: &CancelEventConfig, customer_id: &str, target_url: &str) -> String {
    let mut query = query_string(customer_id, &config.event_id, config.version, None, None);
    push_optional(&mut query, "r", target_url);

    format!(
        "https://{}cancel/{}/{}/?{}",
        domain_alias(&config.queue_domain),
        customer_id,
        config.event_id,
        query
    )
}

/// `c, e, ver, cver` plus `cid` and `l` when non-empty
fn query_string(
    customer_id: &str,
    event_id: &str,
    config_version: Option<i64>,
    culture: Option<&str>,
    layout_name: Option<&str>,
) -> String {
    let mut query = format!(
        "c={}&e={}&ver={}&cver={}",
        encode(customer_id),
        encode(event_id),
        sdk_version_tag(),
        config_version.unwrap_or(MISSING_CONFIG_VERSION)
    );
    push_optional(&mut query, "cid", culture.unwrap_or(""));
    push_optional(&mut query, "l", layout_name.unwrap_or(""));
    query
}

fn push_optional(query: &mut String, key: &str, value: &str) {
    if !value.is_empty() {
        query.push_str(&format!("&{}={}", key, encode(value)));
    }
}

/// Queue domain with exactly one trailing slash
fn domain_alias(queue_domain: &str) -> String {
    format!("{}/", queue_domain.trim_end_matches('/'))
}

/// Form encoding as the queue service expects it
///
/// Alphanumerics and `-_.` pass through, space becomes `+`, everything else
/// is `%XX`. `form_urlencoded` also leaves `*` alone, so that one is patched.
pub fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('*', "%2A")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ver() -> String {
        sdk_version_tag()
    }

    #[test]
    fn test_encode_matches_form_encoding() {
        assert_eq!(encode("abc-_.XYZ09"), "abc-_.XYZ09");
        assert_eq!(encode("a b"), "a+b");
        assert_eq!(encode("a*b~c"), "a%2Ab%7Ec");
        assert_eq!(
            encode("http://shop.example.com/p?x=1&y=2"),
            "http%3A%2F%2Fshop.example.com%2Fp%3Fx%3D1%26y%3D2"
        );
        assert_eq!(encode("æ"), "%C3%A6");
    }

    #[test]
    fn test_queue_url_minimal() {
        let config = QueueEventConfig::new("evt1", "queue.example.com", 20).with_version(2);
        assert_eq!(
            queue_url(&config, "cust1", ""),
            format!("https://queue.example.com/?c=cust1&e=evt1&ver={}&cver=2", ver())
        );
    }

    #[test]
    fn test_queue_url_full() {
        let config = QueueEventConfig::new("evt 1", "queue.example.com", 20)
            .with_culture("en-US")
            .with_layout_name("Summer Sale");
        assert_eq!(
            queue_url(&config, "cust1", "https://shop.example.com/?a=b"),
            format!(
                "https://queue.example.com/?c=cust1&e=evt+1&ver={}&cver=-1&cid=en-US&l=Summer+Sale&t=https%3A%2F%2Fshop.example.com%2F%3Fa%3Db",
                ver()
            )
        );
    }

    #[test]
    fn test_queue_url_ignores_trailing_slash_in_raw_config() {
        let mut config = QueueEventConfig::new("evt1", "queue.example.com", 20);
        config.queue_domain = "queue.example.com/".to_string();
        assert!(queue_url(&config, "cust1", "").starts_with("https://queue.example.com/?c="));
    }

    #[test]
    fn test_error_url() {
        let config = QueueEventConfig::new("evt1", "queue.example.com", 20)
            .with_version(4)
            .with_culture("da-DK");
        let url = error_url(
            &config,
            "cust1",
            "https://shop.example.com/",
            "e_evt1~q_q1~ts_1~h_x",
            "hash",
            1700000000,
        );
        assert_eq!(
            url,
            format!(
                "https://queue.example.com/error/hash/?c=cust1&e=evt1&ver={}&cver=4&cid=da-DK&queueittoken=e_evt1~q_q1~ts_1~h_x&ts=1700000000&t=https%3A%2F%2Fshop.example.com%2F",
                ver()
            )
        );
    }

    #[test]
    fn test_error_url_without_target() {
        let mut config = QueueEventConfig::new("evt1", "queue.example.com", 20);
        config.queue_domain = "queue.example.com///".to_string();
        let url = error_url(&config, "cust1", "", "tok", "timestamp", 5);
        assert_eq!(
            url,
            format!(
                "https://queue.example.com/error/timestamp/?c=cust1&e=evt1&ver={}&cver=-1&queueittoken=tok&ts=5",
                ver()
            )
        );
    }

    #[test]
    fn test_cancel_url() {
        let config = CancelEventConfig::new("evt1", "queue.example.com").with_version(3);
        assert_eq!(
            cancel_url(&config, "cust1", "https://shop.example.com/done"),
            format!(
                "https://queue.example.com/cancel/cust1/evt1/?c=cust1&e=evt1&ver={}&cver=3&r=https%3A%2F%2Fshop.example.com%2Fdone",
                ver()
            )
        );
        assert_eq!(
            cancel_url(&config, "cust1", ""),
            format!(
                "https://queue.example.com/cancel/cust1/evt1/?c=cust1&e=evt1&ver={}&cver=3",
                ver()
            )
        );
    }

    #[test]
    fn test_version_tag() {
        assert_eq!(ver(), format!("v3-rust-{}", crate::VERSION));
    }
}
