//! Input validation and sanitization.
//!
//! This module provides:
//! - Document ID checks for path parameters
//! - URL validation for links stored with applications (SSRF protection)
//! - Email address and free-text sanitizing for the contact form

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;
use url::Url;

/// Maximum URL length to prevent DoS attacks.
const MAX_URL_LENGTH: usize = 2048;

/// Maximum length of a contact message or cover letter.
pub const MAX_MESSAGE_LENGTH: usize = 5000;

/// Maximum length of a name or subject line.
pub const MAX_NAME_LENGTH: usize = 200;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Blocked URL patterns (internal hosts and metadata endpoints).
static BLOCKED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"^https?://127\.").unwrap(),
        Regex::new(r"^https?://localhost").unwrap(),
        Regex::new(r"^https?://10\.").unwrap(),
        Regex::new(r"^https?://172\.(1[6-9]|2[0-9]|3[0-1])\.").unwrap(),
        Regex::new(r"^https?://192\.168\.").unwrap(),
        Regex::new(r"^https?://169\.254\.").unwrap(),
        Regex::new(r"^https?://\[::1\]").unwrap(),
        Regex::new(r"^https?://\[fd").unwrap(),
        Regex::new(r"^https?://\[fe80").unwrap(),
        Regex::new(r"^https?://metadata\.").unwrap(),
    ]
});

/// Validate a link a user attaches to an application or profile.
///
/// Only absolute http(s) URLs to public hosts are accepted.
pub fn validate_document_url(url: &str) -> Result<String, String> {
    if url.len() > MAX_URL_LENGTH {
        return Err(format!(
            "URL exceeds maximum length of {} characters",
            MAX_URL_LENGTH
        ));
    }

    let url = url.trim();
    if url.is_empty() {
        return Err("URL cannot be empty".to_string());
    }

    let parsed = Url::parse(url).map_err(|e| format!("Invalid URL format: {}", e))?;
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(format!(
                "Invalid protocol '{}'. Only HTTP and HTTPS are allowed.",
                scheme
            ))
        }
    }
    if parsed.host_str().is_none() {
        return Err("URL must have a valid domain".to_string());
    }

    let lowered = url.to_lowercase();
    if BLOCKED_PATTERNS.iter().any(|p| p.is_match(&lowered)) {
        warn!(url = %url, "Blocked URL pattern detected");
        return Err("URL appears to target an internal or restricted endpoint".to_string());
    }

    Ok(url.to_string())
}

/// Firestore document IDs: 1-128 chars, no slashes, not `.` or `..`, no `__x__` form.
pub fn is_valid_document_id(id: &str) -> bool {
    if id.is_empty() || id.len() > 128 || id == "." || id == ".." {
        return false;
    }
    if id.starts_with("__") && id.ends_with("__") {
        return false;
    }
    !id.contains('/') && !id.chars().any(|c| c.is_control())
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && EMAIL_PATTERN.is_match(email)
}

/// Sanitize a user-provided string for safe logging and storage.
///
/// Drops control characters except newline and tab, and truncates to `max_chars`.
pub fn sanitize_string(input: &str, max_chars: usize) -> String {
    input
        .trim()
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .take(max_chars)
        .collect()
}

/// Sanitize a single-line value such as a name or subject.
pub fn sanitize_line(input: &str) -> String {
    sanitize_string(input, MAX_NAME_LENGTH)
        .replace(['\n', '\t'], " ")
}
