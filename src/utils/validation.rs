//! Input validation for e-mail addresses and monitored URLs.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Loose e-mail shape: something, `@`, something, `.`, something, no spaces.
pub static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Returns true if `input` looks like an e-mail address.
///
/// # Examples
///
/// ```ignore
/// assert!(validate_email("user@example.com"));
/// assert!(!validate_email("user@localhost"));
/// ```
pub fn validate_email(input: &str) -> bool {
    EMAIL_REGEX.is_match(input)
}

/// Returns true if `input` parses as an absolute URL with a host.
pub fn validate_url(input: &str) -> bool {
    Url::parse(input)
        .map(|url| url.host_str().is_some_and(|h| !h.is_empty()))
        .unwrap_or(false)
}

/// `validator` adapter for DTO fields holding a monitored URL.
pub fn validate_link(input: &str) -> Result<(), validator::ValidationError> {
    if validate_url(input) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("url")
            .with_message("Please provide a valid URL".into()))
    }
}
