//! API routes.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::handlers::admin::add_document;
use crate::handlers::applications::{apply_to_job, my_applications, rate_job, save_job};
use crate::handlers::contact::submit_contact_form;
use crate::handlers::email::send_email;
use crate::handlers::jobs::{count_active_jobs, create_job, get_job, list_active_jobs, search_jobs};
use crate::handlers::uploads::upload_file;
use crate::handlers::users::{create_my_profile, get_my_profile, list_users};
use crate::handlers::{health, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let job_routes = Router::new()
        .route("/jobs", get(list_active_jobs).post(create_job))
        .route("/jobs/count", get(count_active_jobs))
        .route("/jobs/search", get(search_jobs))
        .route("/jobs/:job_id", get(get_job))
        .route("/jobs/:job_id/apply", post(apply_to_job))
        .route("/jobs/:job_id/rate", post(rate_job))
        .route("/jobs/:job_id/save", post(save_job))
        .route("/me/applications", get(my_applications));

    let user_routes = Router::new()
        .route("/users/me", get(get_my_profile).post(create_my_profile))
        .route("/users", get(list_users))
        .route("/uploads/:kind/:filename", put(upload_file))
        .route("/send-email", post(send_email));

    let admin_routes = Router::new().route("/admin/collections/:name", post(add_document));

    // Public and unauthenticated, so held to a much tighter per-IP budget
    let contact_limiter = Arc::new(RateLimiterCache::per_minute(
        state.config.contact_rate_limit_per_minute,
    ));
    let contact_routes = Router::new()
        .route("/contact", post(submit_contact_form))
        .layer(middleware::from_fn_with_state(
            contact_limiter,
            rate_limit_middleware,
        ));

    let rate_limiter = Arc::new(RateLimiterCache::new(
        state.config.rate_limit_rps,
        state.config.rate_limit_burst,
    ));

    let api_routes = Router::new()
        .merge(job_routes)
        .merge(user_routes)
        .merge(admin_routes)
        .merge(contact_routes)
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(timeout_layer(state.config.request_timeout))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

/// Requests running past `timeout` are answered with 408.
fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}
