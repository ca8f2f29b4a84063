//! SendGrid HTTP client.

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::MailerConfig;
use crate::error::{MailerError, MailerResult};
use crate::message::{contact_form_message, EmailMessage};

/// Client for the SendGrid v3 API.
#[derive(Clone)]
pub struct SendGridClient {
    http: Client,
    config: MailerConfig,
}

impl SendGridClient {
    /// Create a new SendGrid client.
    pub fn new(config: MailerConfig) -> MailerResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MailerError::Unavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> MailerResult<Self> {
        Self::new(MailerConfig::from_env()?)
    }

    pub fn config(&self) -> &MailerConfig {
        &self.config
    }

    /// Send one email.
    pub async fn send(&self, message: &EmailMessage) -> MailerResult<()> {
        let resolved = message.resolve(&self.config.from_email)?;
        let url = self.config.send_url();

        debug!(to = %resolved.to, subject = %resolved.subject, "Sending email via SendGrid");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&resolved.to_sendgrid_body())
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "SendGrid request failed");
                MailerError::Unavailable(format!("no response from {}: {}", url, e))
            })?;

        let status = response.status();
        if status.is_success() {
            info!(to = %resolved.to, status = status.as_u16(), "Email sent");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<Value>(&body) {
            Ok(parsed) if parsed.get("errors").is_some() => {
                let errors = parsed["errors"].clone();
                warn!(status = status.as_u16(), errors = %errors, "SendGrid rejected email");
                Err(MailerError::Provider {
                    status: status.as_u16(),
                    errors,
                })
            }
            _ => {
                warn!(status = status.as_u16(), body = %body, "SendGrid returned unexpected response");
                Err(MailerError::Unavailable(format!(
                    "{} returned {}: {}",
                    url, status, body
                )))
            }
        }
    }

    /// Notify the site owner about a contact-form submission.
    ///
    /// Sends to `to` when given, else to `CONTACT_TO_EMAIL`.
    pub async fn send_contact_form_email(
        &self,
        name: &str,
        from: &str,
        message: &str,
        to: Option<&str>,
    ) -> MailerResult<()> {
        let recipient = to
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or(self.config.contact_to_email.as_deref())
            .ok_or_else(MailerError::not_configured)?;

        self.send(&contact_form_message(name, from, message, recipient))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> SendGridClient {
        let config = MailerConfig::new("SG.test-key", "noreply@jobs.test")
            .with_api_base(server.uri())
            .with_contact_to("team@jobs.test");
        SendGridClient::new(config).unwrap()
    }

    fn message() -> EmailMessage {
        EmailMessage {
            to: "hr@acme.test".into(),
            subject: "Welcome".into(),
            text: Some("Hi there".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_send_posts_to_sendgrid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/mail/send"))
            .and(header("authorization", "Bearer SG.test-key"))
            .and(body_partial_json(json!({
                "from": { "email": "noreply@jobs.test" },
                "subject": "Welcome",
                "content": [
                    { "type": "text/plain", "value": "Hi there" },
                    { "type": "text/html", "value": "Hi there" }
                ]
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).send(&message()).await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_message_never_reaches_provider() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202))
            .expect(0)
            .mount(&server)
            .await;

        let mut msg = message();
        msg.text = None;
        let err = client_for(&server).send(&msg).await.unwrap_err();
        assert!(matches!(err, MailerError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_provider_errors_preserved() {
        let server = MockServer::start().await;
        let errors = json!([{ "message": "The from address does not match a verified Sender Identity", "field": "from" }]);
        Mock::given(method("POST"))
            .and(path("/v3/mail/send"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "errors": errors })))
            .mount(&server)
            .await;

        match client_for(&server).send(&message()).await {
            Err(MailerError::Provider { status, errors: got }) => {
                assert_eq!(status, 403);
                assert_eq!(got, errors);
            }
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = client_for(&server).send(&message()).await.unwrap_err();
        match err {
            MailerError::Unavailable(msg) => assert!(msg.contains("/v3/mail/send")),
            other => panic!("expected unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_names_url() {
        let config = MailerConfig::new("SG.test-key", "noreply@jobs.test")
            .with_api_base("http://127.0.0.1:1");
        let client = SendGridClient::new(config).unwrap();

        match client.send(&message()).await {
            Err(MailerError::Unavailable(msg)) => {
                assert!(msg.contains("http://127.0.0.1:1/v3/mail/send"))
            }
            other => panic!("expected unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_contact_form_uses_configured_recipient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "personalizations": [{ "to": [{ "email": "team@jobs.test" }] }],
                "reply_to": { "email": "ann@mail.test" },
                "subject": "New Contact Form Submission from Ann"
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .send_contact_form_email("Ann", "ann@mail.test", "Hello!", None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_contact_form_without_recipient_is_not_configured() {
        let config = MailerConfig::new("SG.test-key", "noreply@jobs.test");
        let client = SendGridClient::new(config).unwrap();
        let err = client
            .send_contact_form_email("Ann", "ann@mail.test", "Hello!", Some(" "))
            .await
            .unwrap_err();
        assert!(matches!(err, MailerError::NotConfigured(_)));
    }
}
