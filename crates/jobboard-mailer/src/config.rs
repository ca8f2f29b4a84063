//! Mailer configuration.

use std::time::Duration;

use crate::error::{MailerError, MailerResult};

pub const DEFAULT_API_BASE: &str = "https://api.sendgrid.com";

/// Configuration for the SendGrid client.
#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub api_key: String,
    /// Default sender when a message has no `from`.
    pub from_email: String,
    pub api_base: String,
    /// Default recipient for contact-form mail.
    pub contact_to_email: Option<String>,
    pub timeout: Duration,
}

impl MailerConfig {
    pub fn new(api_key: impl Into<String>, from_email: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            from_email: from_email.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            contact_to_email: None,
            timeout: Duration::from_secs(10),
        }
    }

    /// Create config from environment variables.
    ///
    /// `SENDGRID_API_KEY` and `SENDGRID_FROM_EMAIL` are required.
    pub fn from_env() -> MailerResult<Self> {
        let api_key = non_empty_var("SENDGRID_API_KEY").ok_or_else(MailerError::not_configured)?;
        let from_email =
            non_empty_var("SENDGRID_FROM_EMAIL").ok_or_else(MailerError::not_configured)?;

        Ok(Self {
            api_key,
            from_email,
            api_base: non_empty_var("SENDGRID_API_BASE")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            contact_to_email: non_empty_var("CONTACT_TO_EMAIL"),
            timeout: Duration::from_secs(
                std::env::var("SENDGRID_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_contact_to(mut self, email: impl Into<String>) -> Self {
        self.contact_to_email = Some(email.into());
        self
    }

    pub fn send_url(&self) -> String {
        format!("{}/v3/mail/send", self.api_base)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
