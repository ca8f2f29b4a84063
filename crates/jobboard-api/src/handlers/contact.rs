//! Public contact form.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use jobboard_models::ContactSubmission;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::security::{is_valid_email, sanitize_line, sanitize_string, MAX_MESSAGE_LENGTH};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub success: bool,
    pub id: String,
    /// False when email is not configured or the notification failed.
    pub email_sent: bool,
}

/// Store the submission, then notify the site owner by email.
///
/// The submission is kept even when the notification cannot be sent.
pub async fn submit_contact_form(
    State(state): State<AppState>,
    Json(request): Json<ContactRequest>,
) -> ApiResult<(StatusCode, Json<ContactResponse>)> {
    let submission = ContactSubmission {
        name: sanitize_line(&request.name),
        email: request.email.trim().to_string(),
        message: sanitize_string(&request.message, MAX_MESSAGE_LENGTH),
    };
    if !is_valid_email(&submission.email) {
        return Err(ApiError::Validation(
            "A valid email address is required".to_string(),
        ));
    }

    let stored = state.contacts.save_contact_submission(submission).await?;
    metrics::record_contact_submission();

    let email_sent = match state.mailer.as_ref() {
        Some(mailer) => {
            let sub = &stored.submission;
            match mailer
                .send_contact_form_email(&sub.name, &sub.email, &sub.message, None)
                .await
            {
                Ok(()) => {
                    metrics::record_email("contact_form", "sent");
                    true
                }
                Err(e) => {
                    metrics::record_email("contact_form", "failed");
                    warn!(submission_id = %stored.id, error = %e, "Contact notification failed");
                    false
                }
            }
        }
        None => false,
    };

    info!(submission_id = %stored.id, email_sent, "Contact form submitted");
    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            success: true,
            id: stored.id,
            email_sent,
        }),
    ))
}
