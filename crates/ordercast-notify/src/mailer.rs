//! Transactional email client.
//!
//! Handlers trigger customer-facing notifications through the
//! [`Notifier`] seam; the shipped implementation posts to an HTTP email
//! API. Email template content is owned by that service, not by this
//! crate: handlers send subject and plain text only.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::NotifyError;

/// One outgoing notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub text: String,
}

/// Delivery acknowledgment from the email service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NotificationReceipt {
    /// Provider-assigned message id, when the service reports one.
    #[serde(default)]
    pub message_id: Option<String>,
}

/// Dispatches user-facing notifications.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync + fmt::Debug {
    /// Sends one notification.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] on transport failure or a non-success
    /// status from the email service.
    async fn dispatch(&self, notification: &Notification) -> Result<NotificationReceipt, NotifyError>;
}

/// Configuration for the email service client.
#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// Email API endpoint URL.
    pub api_url: String,
    /// API token for authentication.
    pub api_token: String,
    /// Sender address.
    pub from: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl MailerConfig {
    /// Creates a config with the default 10-second timeout.
    pub fn new(
        api_url: impl Into<String>,
        api_token: impl Into<String>,
        from: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            api_token: api_token.into(),
            from: from.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP implementation of [`Notifier`].
#[derive(Debug, Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    config: MailerConfig,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

impl HttpMailer {
    /// Creates a client for the email service.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the HTTP client cannot be built.
    pub fn new(config: MailerConfig) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait::async_trait]
impl Notifier for HttpMailer {
    async fn dispatch(&self, notification: &Notification) -> Result<NotificationReceipt, NotifyError> {
        debug!(to = %notification.to, subject = %notification.subject, "dispatching notification");

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_token)
            .json(&SendRequest {
                from: &self.config.from,
                to: &notification.to,
                subject: &notification.subject,
                text: &notification.text,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status { service: "mailer", status: status.as_u16() });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_parses_message_id() {
        let receipt: NotificationReceipt =
            serde_json::from_str(r#"{"message_id": "msg_123"}"#).unwrap();
        assert_eq!(receipt.message_id.as_deref(), Some("msg_123"));
    }

    #[test]
    fn receipt_tolerates_missing_message_id() {
        let receipt: NotificationReceipt = serde_json::from_str("{}").unwrap();
        assert!(receipt.message_id.is_none());
    }

    #[test]
    fn send_request_serializes_flat() {
        let request = SendRequest {
            from: "orders@example.com",
            to: "jon@example.com",
            subject: "Your order",
            text: "Thanks!",
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["from"], "orders@example.com");
        assert_eq!(value["to"], "jon@example.com");
    }
}
