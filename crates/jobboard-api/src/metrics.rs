//! Prometheus metrics for the API server.

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return the handle that renders `/metrics`.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "jobboard_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "jobboard_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "jobboard_http_requests_in_flight";

    // Uploads and email
    pub const UPLOADS_TOTAL: &str = "jobboard_uploads_total";
    pub const UPLOAD_BYTES: &str = "jobboard_upload_bytes";
    pub const EMAILS_TOTAL: &str = "jobboard_emails_total";
    pub const CONTACT_SUBMISSIONS_TOTAL: &str = "jobboard_contact_submissions_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "jobboard_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a stored upload.
pub fn record_upload(kind: &str, bytes: usize) {
    let labels = [("kind", kind.to_string())];
    counter!(names::UPLOADS_TOTAL, &labels).increment(1);
    histogram!(names::UPLOAD_BYTES, &labels).record(bytes as f64);
}

/// Record an email send attempt. `outcome` is `sent` or `failed`.
pub fn record_email(kind: &'static str, outcome: &'static str) {
    counter!(names::EMAILS_TOTAL, "kind" => kind, "outcome" => outcome).increment(1);
}

pub fn record_contact_submission() {
    counter!(names::CONTACT_SUBMISSIONS_TOTAL).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Replace IDs and file names in a request path with route placeholders.
fn sanitize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    let mut out: Vec<&str> = Vec::with_capacity(segments.len());

    for (i, segment) in segments.iter().enumerate() {
        let previous = if i > 0 { segments[i - 1] } else { "" };
        let before_previous = if i > 1 { segments[i - 2] } else { "" };

        let replaced = match (before_previous, previous) {
            ("api", "jobs") if !matches!(*segment, "count" | "search" | "") => ":job_id",
            ("api", "uploads") if !segment.is_empty() => ":kind",
            ("uploads", _) if !segment.is_empty() => ":filename",
            ("admin", "collections") if !segment.is_empty() => ":name",
            _ => segment,
        };
        out.push(replaced);
    }

    out.join("/")
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    // Decrement even if the request future is dropped
    let _in_flight = scopeguard::guard((), |_| {
        gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);
    });

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
