//! Resend email adapter.
//!
//! Sends transactional email through `POST /emails` on the Resend API.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use super::templates::{
    payment_confirmation_html, welcome_html, PAYMENT_CONFIRMATION_SUBJECT, WELCOME_SUBJECT,
};
use crate::ports::{EmailError, EmailSender, PaymentConfirmationEmail, WelcomeEmail};

/// Resend client configuration.
#[derive(Clone)]
pub struct ResendConfig {
    api_key: SecretString,
    from: String,
    app_url: String,
    api_base_url: String,
    timeout: Duration,
}

impl ResendConfig {
    /// `from` is a full header value such as `Aionyx <noreply@aionyx.ai>`.
    pub fn new(api_key: SecretString, from: impl Into<String>, app_url: impl Into<String>) -> Self {
        Self {
            api_key,
            from: from.into(),
            app_url: app_url.into().trim_end_matches('/').to_string(),
            api_base_url: "https://api.resend.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: String,
}

pub struct ResendEmailSender {
    config: ResendConfig,
    http_client: reqwest::Client,
}

impl ResendEmailSender {
    pub fn new(config: ResendConfig) -> Result<Self, EmailError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EmailError::Unavailable(e.to_string()))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    async fn send(&self, to: &str, subject: &str, html: String) -> Result<(), EmailError> {
        let body = SendEmailRequest {
            from: &self.config.from,
            to: [to],
            subject,
            html,
        };

        let response = self
            .http_client
            .post(format!("{}/emails", self.config.api_base_url))
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(subject, "Email accepted by Resend");
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        let message = format!("Resend returned {}: {}", status, text);
        if status.is_server_error() || status.as_u16() == 429 {
            Err(EmailError::Unavailable(message))
        } else {
            Err(EmailError::Rejected(message))
        }
    }
}

#[async_trait]
impl EmailSender for ResendEmailSender {
    async fn send_welcome_email(&self, email: &WelcomeEmail) -> Result<(), EmailError> {
        let html = welcome_html(email, &self.config.app_url);
        self.send(&email.email, WELCOME_SUBJECT, html).await
    }

    async fn send_payment_confirmation_email(
        &self,
        email: &PaymentConfirmationEmail,
    ) -> Result<(), EmailError> {
        let html = payment_confirmation_html(email, &self.config.app_url);
        self.send(&email.email, PAYMENT_CONFIRMATION_SUBJECT, html)
            .await
    }
}
