//! Outbound transactional email

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_MAIL_API_URL: &str = "https://api.resend.com/emails";

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Mail is not configured: {0} is not set")]
    NotConfigured(&'static str),

    #[error("Mail request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Mail provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// A rendered message ready to send
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one message; attempted exactly once
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub from: Option<String>,
    /// Overrides the admin address from settings
    pub admin_recipient: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_MAIL_API_URL.to_string(),
            from: None,
            admin_recipient: None,
        }
    }
}

impl MailConfig {
    /// Outbound mail is enabled by the presence of an API key
    pub fn enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

/// Mailer posting JSON to an HTTP mail API with a bearer key
pub struct HttpMailer {
    client: reqwest::Client,
    config: MailConfig,
}

impl HttpMailer {
    pub fn new(config: MailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &MailConfig {
        &self.config
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(MailError::NotConfigured("MAIL_API_KEY"))?;
        let from = self
            .config
            .from
            .as_deref()
            .ok_or(MailError::NotConfigured("MAIL_FROM"))?;

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&SendRequest {
                from,
                to: [email.to.as_str()],
                subject: &email.subject,
                html: &email.html,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Sent '{}' to {}", email.subject, email.to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> OutgoingEmail {
        OutgoingEmail {
            to: "ana@example.com".to_string(),
            subject: "Hi".to_string(),
            html: "<p>Hi</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_api_key_is_reported() {
        let mailer = HttpMailer::new(MailConfig::default());
        assert!(!mailer.config().enabled());
        let err = mailer.send(&email()).await.unwrap_err();
        assert!(matches!(err, MailError::NotConfigured("MAIL_API_KEY")));
    }

    #[tokio::test]
    async fn test_missing_sender_is_reported() {
        let mailer = HttpMailer::new(MailConfig {
            api_key: Some("key".to_string()),
            ..Default::default()
        });
        let err = mailer.send(&email()).await.unwrap_err();
        assert!(matches!(err, MailError::NotConfigured("MAIL_FROM")));
    }
}
