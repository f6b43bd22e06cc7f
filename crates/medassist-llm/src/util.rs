//! Shared helpers for HTTP backend adapters

use crate::error::Error;
use reqwest::StatusCode;

/// Minimum key length to display partial key
const MIN_KEY_LENGTH_FOR_PARTIAL_DISPLAY: usize = 8;

/// Number of characters to show at start/end of masked key
const KEY_MASK_VISIBLE_CHARS: usize = 4;

/// Longest API error text carried into an [`Error`]
const MAX_ERROR_LEN: usize = 300;

/// Fragments that must never reach logs or callers
const SENSITIVE_PATTERNS: &[&str] = &[
    "api_key",
    "api-key",
    "apikey",
    "authorization",
    "bearer",
    "secret",
    "password",
    "credential",
];

/// Mask API key for safe display in logs
///
/// ```
/// use medassist_llm::util::mask_api_key;
/// assert_eq!(mask_api_key("sk-1234567890abcdef"), "sk-1...cdef");
/// assert_eq!(mask_api_key("short"), "****");
/// ```
#[must_use]
pub fn mask_api_key(key: &str) -> String {
    if key.len() <= MIN_KEY_LENGTH_FOR_PARTIAL_DISPLAY || !key.is_ascii() {
        return "****".to_string();
    }
    format!(
        "{}...{}",
        &key[..KEY_MASK_VISIBLE_CHARS],
        &key[key.len() - KEY_MASK_VISIBLE_CHARS..]
    )
}

/// Truncate to at most `max_bytes`, never splitting a character
#[must_use]
pub fn truncate_safe(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Strip credentials and noise from a backend error body
#[must_use]
pub fn sanitize_api_error(error: &str) -> String {
    let lower = error.to_lowercase();
    if SENSITIVE_PATTERNS.iter().any(|p| lower.contains(p)) {
        return "backend rejected the request (details withheld)".to_string();
    }
    if error.len() > MAX_ERROR_LEN {
        format!("{}...(truncated)", truncate_safe(error, MAX_ERROR_LEN))
    } else {
        error.to_string()
    }
}

/// Map a non-success HTTP status to a classified error
#[must_use]
pub fn error_for_status(status: StatusCode, message: String) -> Error {
    match status.as_u16() {
        401 | 403 => Error::Authentication(message),
        400 | 404 | 413 | 422 => Error::InvalidRequest(message),
        408 => Error::Unavailable(message),
        429 => Error::RateLimit,
        500..=599 => Error::Unavailable(message),
        _ => Error::Api(message),
    }
}

/// Map a transport failure to a classified error
#[must_use]
pub fn error_for_transport(error: &reqwest::Error, timeout_ms: u64) -> Error {
    if error.is_timeout() {
        Error::Timeout(timeout_ms)
    } else if error.is_connect() {
        Error::Network(format!("connection failed: {}", sanitize_api_error(&error.to_string())))
    } else {
        Error::Network(sanitize_api_error(&error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureClass;

    #[test]
    fn test_mask_api_key() {
        let masked = mask_api_key("sk-1234567890abcdefghij");
        assert_eq!(masked, "sk-1...ghij");
        assert_eq!(mask_api_key("12345678"), "****");
        assert_eq!(mask_api_key(""), "****");
    }

    #[test]
    fn test_truncate_safe_multibyte() {
        let s = "médico";
        assert_eq!(truncate_safe(s, 2), "m");
        assert_eq!(truncate_safe(s, 3), "mé");
        assert_eq!(truncate_safe(s, 100), s);
    }

    #[test]
    fn test_sanitize_hides_credentials() {
        let out = sanitize_api_error("Invalid Authorization: Bearer sk-abc");
        assert!(!out.contains("sk-abc"));
        assert_eq!(sanitize_api_error("model overloaded"), "model overloaded");
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "x".repeat(1000);
        assert!(sanitize_api_error(&long).len() < 400);
    }

    #[test]
    fn test_status_classification() {
        let cases = [
            (401, FailureClass::Fatal),
            (403, FailureClass::Fatal),
            (400, FailureClass::Fatal),
            (404, FailureClass::Fatal),
            (429, FailureClass::Transient),
            (500, FailureClass::Transient),
            (503, FailureClass::Transient),
        ];
        for (code, class) in cases {
            let status = StatusCode::from_u16(code).unwrap();
            assert_eq!(error_for_status(status, "x".into()).class(), class, "status {code}");
        }
    }
}
