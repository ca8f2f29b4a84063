//! Mailer error types.

use thiserror::Error;

pub type MailerResult<T> = Result<T, MailerError>;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotConfigured(String),

    /// SendGrid rejected the request. `errors` is the provider's `errors` array.
    #[error("SendGrid returned {status}")]
    Provider {
        status: u16,
        errors: serde_json::Value,
    },

    #[error("Email service unavailable: {0}")]
    Unavailable(String),
}

impl MailerError {
    pub fn not_configured() -> Self {
        Self::NotConfigured("Email service not configured".to_string())
    }

    /// Provider details suitable for an error response body.
    pub fn details(&self) -> Option<&serde_json::Value> {
        match self {
            MailerError::Provider { errors, .. } => Some(errors),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            MailerError::Unavailable(_) => true,
            MailerError::Provider { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_details() {
        let err = MailerError::Provider {
            status: 400,
            errors: json!([{"message": "bad from"}]),
        };
        assert_eq!(err.details(), Some(&json!([{"message": "bad from"}])));
        assert!(!err.is_retryable());
        assert!(MailerError::not_configured().details().is_none());
    }

    #[test]
    fn test_retryable() {
        assert!(MailerError::Unavailable("x".into()).is_retryable());
        assert!(MailerError::Provider {
            status: 503,
            errors: serde_json::Value::Null
        }
        .is_retryable());
        assert!(!MailerError::InvalidArgument("x".into()).is_retryable());
    }
}
