//! Outbound email delivery.
//!
//! Delivery is fire-and-forget relative to request handling: flows dispatch a
//! message and answer the caller without waiting for the provider. A failed
//! send is logged and never turns a completed state transition into an error;
//! the OTP record already exists either way, and `resend-otp` recovers lost
//! mail.
//!
//! The default sender for local dev is [`LogEmailSender`], which logs the
//! message and returns `Ok(())`. With a provider API key configured,
//! [`HttpApiEmailSender`] posts the message to the provider's HTTP endpoint.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Default provider endpoint (SendGrid v3 mail send).
pub const DEFAULT_API_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

const SEND_TIMEOUT_SECONDS: u64 = 10;

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Email delivery abstraction.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error; callers treat failures as
    /// non-fatal.
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs the message instead of delivering it.
#[derive(Clone, Copy, Debug)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.html,
            "email delivery stub"
        );
        Ok(())
    }
}

/// Sends through an HTTP email provider (SendGrid-shaped payload).
pub struct HttpApiEmailSender {
    client: Client,
    endpoint: String,
    api_key: SecretString,
    sender: String,
}

impl HttpApiEmailSender {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: String, api_key: SecretString, sender: String) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(Duration::from_secs(SEND_TIMEOUT_SECONDS))
            .build()
            .context("failed to build email HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            sender,
        })
    }
}

#[async_trait]
impl EmailSender for HttpApiEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let payload = json!({
            "personalizations": [{ "to": [{ "email": message.to }] }],
            "from": { "email": self.sender },
            "subject": message.subject,
            "content": [{ "type": "text/html", "value": message.html }],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .context("email provider request failed")?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(anyhow!("email provider returned {status}"))
        }
    }
}

/// Spawn the send so the caller's response never waits on delivery.
pub fn dispatch(sender: Arc<dyn EmailSender>, message: EmailMessage) {
    tokio::spawn(async move {
        if let Err(err) = sender.send(&message).await {
            error!(to = %message.to, "Failed to deliver email: {err:#}");
        }
    });
}

/// Build the OTP email for a flow.
///
/// `purpose` is the human phrase ("email verification" / "password reset").
#[must_use]
pub fn otp_message(to: &str, code: &str, purpose: &str, ttl_minutes: i64) -> EmailMessage {
    let subject = format!("Your {purpose} code");
    let html = format!(
        "<p>Your {purpose} code is:</p>\
         <h2>{code}</h2>\
         <p>This code will expire in {ttl_minutes} minutes.</p>\
         <p>If you didn't request this code, please ignore this email.</p>"
    );

    EmailMessage {
        to: to.to_string(),
        subject,
        html,
    }
}
