//! Contact form submissions (`store` collection).

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Type tag stored with every contact form submission.
pub const CONTACT_FORM_TYPE: &str = "contact_form";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactSubmission {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() || self.message.trim().is_empty() {
            return Err("Name and message are required".to_string());
        }
        if !self.email.contains('@') {
            return Err("A valid email address is required".to_string());
        }
        Ok(())
    }
}

/// Review state of a stored submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    #[default]
    New,
    Read,
    Replied,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::New => "new",
            SubmissionStatus::Read => "read",
            SubmissionStatus::Replied => "replied",
        }
    }
}

/// Stored submission with its generated ID.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredSubmission {
    pub id: String,
    #[serde(flatten)]
    pub submission: ContactSubmission,
    pub timestamp: DateTime<Utc>,
    pub status: SubmissionStatus,
}
