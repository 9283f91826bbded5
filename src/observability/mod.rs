//! Observability support for the SendGrid client.
//!
//! The client emits `tracing` spans and events; this module provides an
//! optional subscriber bootstrap for applications that do not install their
//! own, and the redaction helpers used wherever credentials could reach a log
//! line or a `Debug` impl.

mod logging;

pub use logging::{init_tracing, LogFormat, LogLevel, LoggingConfig};

use once_cell::sync::Lazy;
use regex::Regex;

static SECRET_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"SG\.[A-Za-z0-9_\-.]+", "SG.***"),
        (r"(?i)bearer\s+[A-Za-z0-9_\-.=+/]+", "Bearer ***"),
        (r"(?i)basic\s+[A-Za-z0-9_\-.=+/]+", "Basic ***"),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
    .collect()
});

/// Masks API keys and authorization parameters in free text.
///
/// # Examples
///
/// ```
/// use integrations_sendgrid::observability::redact_secrets;
///
/// let masked = redact_secrets("Authorization: Bearer SG.abc123.def456");
/// assert!(!masked.contains("abc123"));
/// ```
pub fn redact_secrets(text: &str) -> String {
    let mut result = text.to_string();
    for (re, replacement) in SECRET_PATTERNS.iter() {
        result = re.replace_all(&result, *replacement).into_owned();
    }
    result
}

/// Returns a loggable version of a header value.
///
/// Authorization-bearing headers are fully masked; other values pass through
/// [`redact_secrets`].
pub fn redact_header(name: &str, value: &str) -> String {
    let name = name.to_ascii_lowercase();
    if name == "authorization" || name.contains("api-key") || name.contains("token") {
        "[REDACTED]".to_string()
    } else {
        redact_secrets(value)
    }
}
