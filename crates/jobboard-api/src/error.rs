//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use jobboard_firestore::FirestoreError;
use jobboard_mailer::MailerError;
use jobboard_storage::StorageError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Firestore error: {0}")]
    Firestore(#[from] FirestoreError),

    #[error("Email error: {0}")]
    Mailer(#[from] MailerError),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Status code and stable snake_case tag for the response body.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "permission_denied"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "invalid_argument"),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ApiError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            ApiError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            ApiError::Firestore(e) => firestore_status(e),
            ApiError::Storage(e) => storage_status(e),
            ApiError::Mailer(e) => mailer_status(e),
        }
    }

    fn is_internal(&self) -> bool {
        self.status_and_code().0 == StatusCode::INTERNAL_SERVER_ERROR
    }

    /// Message shown to callers. Domain errors carry their own wording.
    fn detail(&self) -> String {
        match self {
            ApiError::Firestore(
                e @ (FirestoreError::NotFound(_) | FirestoreError::AlreadyApplied(_)),
            ) => e.to_string(),
            ApiError::Firestore(FirestoreError::InvalidArgument(msg)) => msg.clone(),
            ApiError::Mailer(
                e @ (MailerError::InvalidArgument(_) | MailerError::NotConfigured(_)),
            ) => e.to_string(),
            _ => self.to_string(),
        }
    }
}

fn firestore_status(e: &FirestoreError) -> (StatusCode, &'static str) {
    match e {
        FirestoreError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        FirestoreError::AlreadyApplied(_) => (StatusCode::CONFLICT, "already_applied"),
        FirestoreError::AlreadyExists(_) => (StatusCode::CONFLICT, "already_exists"),
        FirestoreError::PreconditionFailed(_) => (StatusCode::CONFLICT, "conflict"),
        FirestoreError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "invalid_argument"),
        FirestoreError::PermissionDenied(_) => (StatusCode::FORBIDDEN, "permission_denied"),
        FirestoreError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "unauthenticated"),
        FirestoreError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
        FirestoreError::ServerError(..) | FirestoreError::Network(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    }
}

fn storage_status(e: &StorageError) -> (StatusCode, &'static str) {
    match e {
        e if e.is_client_error() => (StatusCode::BAD_REQUEST, "invalid_argument"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    }
}

fn mailer_status(e: &MailerError) -> (StatusCode, &'static str) {
    match e {
        MailerError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "invalid_argument"),
        MailerError::NotConfigured(_) => (StatusCode::SERVICE_UNAVAILABLE, "failed_precondition"),
        MailerError::Provider { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "email_failed"),
        MailerError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if let ApiError::Mailer(MailerError::Provider { errors, .. }) = &self {
            error!(errors = %errors, "Email provider rejected request");
            let body = json!({
                "success": false,
                "error": "Failed to send email",
                "details": errors,
            });
            return (status, Json(body)).into_response();
        }

        // Don't expose internal error details in production
        let detail = if self.is_internal() {
            error!("Request failed: {}", self);
            if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                "An internal error occurred".to_string()
            } else {
                self.to_string()
            }
        } else {
            self.detail()
        };

        (status, Json(ErrorResponse { detail, code })).into_response()
    }
}
