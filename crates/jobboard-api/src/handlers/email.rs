//! Transactional email endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::info;

use jobboard_mailer::EmailMessage;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::metrics;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub success: bool,
}

/// Send an email through SendGrid. `from` defaults to the configured sender.
pub async fn send_email(
    State(state): State<AppState>,
    user: AuthUser,
    Json(message): Json<EmailMessage>,
) -> ApiResult<Json<SendEmailResponse>> {
    let mailer = state.mailer()?;

    match mailer.send(&message).await {
        Ok(()) => {
            metrics::record_email("direct", "sent");
            info!(uid = %user.uid, to = %message.to, "Email sent on behalf of user");
            Ok(Json(SendEmailResponse { success: true }))
        }
        Err(e) => {
            metrics::record_email("direct", "failed");
            Err(e.into())
        }
    }
}
