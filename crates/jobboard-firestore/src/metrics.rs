//! Document store metrics.
//!
//! Request counters and latency histograms for the store, plus counters for
//! the engagement writes the repositories perform.

use metrics::{counter, histogram};

// =============================================================================
// Metric Names
// =============================================================================

pub mod names {
    /// Total store requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "firestore_requests_total";

    /// Total retry attempts by operation.
    pub const RETRIES_TOTAL: &str = "firestore_retries_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "firestore_latency_seconds";

    /// Optimistic-concurrency conflicts by operation.
    pub const CONFLICTS_TOTAL: &str = "firestore_conflicts_total";

    /// Job engagement writes by kind (application, rating, save, unsave, view).
    pub const ENGAGEMENT_TOTAL: &str = "jobboard_engagement_total";

    /// View increments that failed and were dropped.
    pub const VIEW_FAILURES_TOTAL: &str = "jobboard_view_increment_failures_total";
}

// =============================================================================
// Recording Functions
// =============================================================================

/// Record metrics for a completed store request.
pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record a transient-failure retry.
pub fn record_retry(operation: &str) {
    counter!(
        names::RETRIES_TOTAL,
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Record a lost compare-and-swap race.
pub fn record_conflict(operation: &str) {
    counter!(
        names::CONFLICTS_TOTAL,
        "operation" => operation.to_string()
    )
    .increment(1);
}

pub fn record_engagement(kind: &'static str) {
    counter!(names::ENGAGEMENT_TOTAL, "kind" => kind).increment(1);
}

pub fn record_view_failure() {
    counter!(names::VIEW_FAILURES_TOTAL).increment(1);
}
