//! Email messages and the SendGrid request body.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{MailerError, MailerResult};

pub const MISSING_FIELDS_MESSAGE: &str =
    "Missing required fields: to, from, subject, and at least one of text or html";

/// An outgoing email as callers submit it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailMessage {
    #[serde(default)]
    pub to: String,
    /// Sender; the configured sender is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

/// A validated message with both bodies filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEmail {
    pub to: String,
    pub from: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub text: String,
    pub html: String,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

impl EmailMessage {
    /// Validate and fill defaults. `html` falls back to `text` and `text` to `html`.
    pub fn resolve(&self, default_from: &str) -> MailerResult<ResolvedEmail> {
        let to = present(Some(&self.to));
        let from = present(self.from.as_deref()).or_else(|| present(Some(default_from)));
        let subject = present(Some(&self.subject));
        let text = present(self.text.as_deref());
        let html = present(self.html.as_deref());

        let (Some(to), Some(from), Some(subject)) = (to, from, subject) else {
            return Err(MailerError::InvalidArgument(MISSING_FIELDS_MESSAGE.to_string()));
        };
        let (text, html) = match (text, html) {
            (None, None) => {
                return Err(MailerError::InvalidArgument(MISSING_FIELDS_MESSAGE.to_string()))
            }
            (Some(t), None) => (t, t),
            (None, Some(h)) => (h, h),
            (Some(t), Some(h)) => (t, h),
        };

        Ok(ResolvedEmail {
            to: to.to_string(),
            from: from.to_string(),
            reply_to: present(self.reply_to.as_deref()).map(str::to_string),
            subject: subject.to_string(),
            text: text.to_string(),
            html: html.to_string(),
        })
    }
}

impl ResolvedEmail {
    /// Body for `POST /v3/mail/send`.
    pub fn to_sendgrid_body(&self) -> Value {
        let mut body = json!({
            "personalizations": [{ "to": [{ "email": self.to }] }],
            "from": { "email": self.from },
            "subject": self.subject,
            "content": [
                { "type": "text/plain", "value": self.text },
                { "type": "text/html", "value": self.html },
            ],
        });
        if let Some(reply_to) = &self.reply_to {
            body["reply_to"] = json!({ "email": reply_to });
        }
        body
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Compose the notification for a contact-form submission.
///
/// The visitor's address goes into the body and `reply_to`; the configured
/// sender stays the envelope sender.
pub fn contact_form_message(name: &str, visitor_email: &str, message: &str, to: &str) -> EmailMessage {
    let text = format!(
        "New contact form submission:\n\nName: {name}\nEmail: {visitor_email}\n\nMessage:\n{message}"
    );
    let html = format!(
        concat!(
            "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">",
            "<h2 style=\"color: #333;\">New Contact Form Submission</h2>",
            "<p><strong>Name:</strong> {}</p>",
            "<p><strong>Email:</strong> {}</p>",
            "<div style=\"margin-top: 20px;\"><strong>Message:</strong>",
            "<p style=\"white-space: pre-wrap; background: #f5f5f5; padding: 15px; border-radius: 5px;\">{}</p>",
            "</div></div>"
        ),
        escape_html(name),
        escape_html(visitor_email),
        escape_html(message),
    );

    EmailMessage {
        to: to.to_string(),
        from: None,
        reply_to: Some(visitor_email.to_string()),
        subject: format!("New Contact Form Submission from {}", name.trim()),
        text: Some(text),
        html: Some(html),
    }
}
