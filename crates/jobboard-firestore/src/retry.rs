//! Retry policies.
//!
//! Two loops live here:
//! - `with_retry`: transient failures (network, 429, 5xx) with exponential
//!   backoff and full jitter. Only used for idempotent reads.
//! - `retry_on_conflict`: optimistic-concurrency loops that re-read and
//!   re-commit when an `updateTime` precondition fails.

use std::time::Duration;

use tracing::{debug, info_span, warn, Instrument};

use crate::error::{FirestoreError, FirestoreResult};
use crate::metrics::{record_conflict, record_retry};

/// Attempts for a compare-and-swap loop before giving up.
pub const MAX_CONFLICT_ATTEMPTS: u32 = 5;

/// Linear step between compare-and-swap attempts.
const CONFLICT_BACKOFF_STEP_MS: u64 = 50;

// =============================================================================
// Configuration
// =============================================================================

/// Transient-failure retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Base delay for exponential backoff (in milliseconds).
    pub base_delay_ms: u64,
    /// Maximum delay cap (in milliseconds).
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 5000,
        }
    }
}

impl RetryConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let read = |key: &str, fallback: u64| {
            std::env::var(key)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(fallback)
        };

        Self {
            max_retries: read("FIRESTORE_MAX_RETRIES", defaults.max_retries as u64) as u32,
            base_delay_ms: read("FIRESTORE_RETRY_BASE_MS", defaults.base_delay_ms),
            max_delay_ms: read("FIRESTORE_RETRY_MAX_MS", defaults.max_delay_ms),
        }
    }
}

// =============================================================================
// Transient Retry
// =============================================================================

/// Execute an idempotent operation, retrying transient failures.
///
/// Retries network errors, 429 (honoring the retry hint) and 5xx.
/// Everything else is returned immediately.
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    operation: &str,
    op: F,
) -> FirestoreResult<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = FirestoreResult<T>>,
{
    let mut attempt = 0;

    loop {
        let span = info_span!("firestore_retry", operation = %operation, attempt = attempt + 1);

        match op().instrument(span).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                let delay = calculate_delay(config, attempt, e.retry_after_ms());
                warn!(
                    operation = %operation,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Store operation failed, retrying: {}",
                    e
                );
                record_retry(operation);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Exponential backoff with full jitter, floored at the base delay.
fn calculate_delay(config: &RetryConfig, attempt: u32, retry_after_ms: Option<u64>) -> Duration {
    if let Some(after) = retry_after_ms {
        return Duration::from_millis(after);
    }

    let capped = config
        .base_delay_ms
        .saturating_mul(2u64.saturating_pow(attempt))
        .min(config.max_delay_ms);

    // Sub-second clock noise is enough spread for a handful of callers.
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    let jittered = (capped as f64 * ((nanos % 1000) as f64 / 1000.0)) as u64;

    Duration::from_millis(jittered.max(config.base_delay_ms))
}

// =============================================================================
// Conflict Retry
// =============================================================================

/// Backoff before compare-and-swap attempt `attempt + 1`.
pub fn conflict_backoff(attempt: u32) -> Duration {
    Duration::from_millis(CONFLICT_BACKOFF_STEP_MS * (attempt as u64 + 1))
}

/// Run a read-modify-write attempt until it commits without a precondition failure.
///
/// `op` must re-read the document on every call so each attempt works from a
/// fresh `updateTime`.
pub async fn retry_on_conflict<T, F, Fut>(
    operation: &str,
    max_attempts: u32,
    op: F,
) -> FirestoreResult<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = FirestoreResult<T>>,
{
    for attempt in 0..max_attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_precondition_failed() => {
                debug!(
                    operation = %operation,
                    attempt = attempt + 1,
                    "Concurrent update detected, retrying: {}",
                    e
                );
                record_conflict(operation);
                if attempt + 1 < max_attempts {
                    tokio::time::sleep(conflict_backoff(attempt)).await;
                }
            }
            Err(e) => return Err(e),
        }
    }

    warn!(
        operation = %operation,
        attempts = max_attempts,
        "Giving up after repeated concurrent updates"
    );
    Err(FirestoreError::PreconditionFailed(format!(
        "{} gave up after {} concurrent updates",
        operation, max_attempts
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_retry_config_default() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_delay_ms, 100);
        assert_eq!(config.max_delay_ms, 5000);
    }

    #[test]
    fn test_calculate_delay_bounds() {
        let config = RetryConfig {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 2000,
        };
        assert_eq!(
            calculate_delay(&config, 0, Some(2500)),
            Duration::from_millis(2500)
        );
        let delay = calculate_delay(&config, 10, None);
        assert!(delay.as_millis() >= 1000 && delay.as_millis() <= 2000);
    }

    #[test]
    fn test_conflict_backoff_is_linear() {
        assert_eq!(conflict_backoff(0), Duration::from_millis(50));
        assert_eq!(conflict_backoff(2), Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_with_retry_recovers_from_server_error() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig {
            max_retries: 2,
            base_delay_ms: 1,
            max_delay_ms: 2,
        };

        let result = with_retry(&config, "get_document", || async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(FirestoreError::from_http_status(503, "unavailable"))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_with_retry_does_not_retry_not_found() {
        let calls = AtomicU32::new(0);
        let result: FirestoreResult<()> = with_retry(&RetryConfig::default(), "get", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(FirestoreError::not_found("missing"))
        })
        .await;

        assert!(result.unwrap_err().is_not_found());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_on_conflict_gives_up() {
        let calls = AtomicU32::new(0);
        let result: FirestoreResult<()> = retry_on_conflict("rate_job", 2, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(FirestoreError::PreconditionFailed("stale".into()))
        })
        .await;

        assert!(result.unwrap_err().is_precondition_failed());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
