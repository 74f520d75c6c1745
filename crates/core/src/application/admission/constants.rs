// Admission constants (ADR: No magic values)

/// Platform tag reported to the queue service in `ver=v3-<tag>-<version>`
pub const SDK_PLATFORM_TAG: &str = "rust";

/// SDK release reported to the queue service
pub const SDK_VERSION: &str = crate::VERSION;

/// Query parameter carrying the raw token on error redirects
pub const QUEUE_IT_TOKEN_PARAM: &str = "queueittoken";

/// Rendered in `cver` when the event config has no version
pub const MISSING_CONFIG_VERSION: i64 = -1;

/// `ver` query value identifying this SDK
pub fn sdk_version_tag() -> String {
    format!("v3-{}-{}", SDK_PLATFORM_TAG, SDK_VERSION)
}
