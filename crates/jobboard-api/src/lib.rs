//! Axum HTTP API server for the job board.
//!
//! This crate provides:
//! - REST endpoints for jobs, applications, profiles, uploads, email and the contact form
//! - Firebase ID token verification and the admin role check
//! - Rate limiting and security headers
//! - Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod state;

pub use auth::{AuthUser, StaticTokens, TokenVerifier};
pub use config::{ApiConfig, StoreBackend};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
