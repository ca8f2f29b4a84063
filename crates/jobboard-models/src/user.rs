//! User profile models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Role assigned to every new profile.
pub const DEFAULT_ROLE: &str = "user";

/// Role allowed to list users and write arbitrary collections.
pub const ADMIN_ROLE: &str = "admin";

/// Profile document stored at `users/{uid}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Auth provider user ID (document key).
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub language: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_letter_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// Data collected by the sign-up form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewUserProfile {
    #[serde(default)]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub resume_url: Option<String>,
    #[serde(default)]
    pub cover_letter_url: Option<String>,
}

impl NewUserProfile {
    pub fn validate(&self) -> Result<(), String> {
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err("A valid email address is required".to_string());
        }
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err("First and last name are required".to_string());
        }
        Ok(())
    }

    /// Build the stored profile with the default role.
    pub fn into_profile(self, uid: impl Into<String>, now: DateTime<Utc>) -> UserProfile {
        UserProfile {
            id: uid.into(),
            email: self.email.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            gender: self.gender,
            country: self.country,
            language: self.language,
            role: DEFAULT_ROLE.to_string(),
            resume_url: self.resume_url,
            cover_letter_url: self.cover_letter_url,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_profile_gets_default_role() {
        let profile = NewUserProfile {
            email: " ada@example.com ".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            ..Default::default()
        }
        .into_profile("uid-1", Utc::now());

        assert_eq!(profile.role, "user");
        assert_eq!(profile.email, "ada@example.com");
        assert!(!profile.is_admin());
        assert_eq!(profile.display_name(), "Ada Lovelace");
    }

    #[test]
    fn test_validate_requires_email_and_names() {
        let mut p = NewUserProfile {
            email: "nope".to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            ..Default::default()
        };
        assert!(p.validate().is_err());
        p.email = "a@b.co".to_string();
        assert!(p.validate().is_ok());
        p.last_name.clear();
        assert!(p.validate().is_err());
    }
}
