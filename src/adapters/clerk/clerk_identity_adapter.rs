//! Clerk Backend API adapter.
//!
//! Pushes billing state into the user's public metadata via
//! `PATCH /v1/users/{user_id}/metadata`. Clerk deep-merges the payload, so
//! unrelated metadata keys are preserved.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::domain::foundation::UserId;
use crate::ports::{BillingMetadata, IdentityError, IdentityProvider};

#[derive(Clone)]
pub struct ClerkConfig {
    secret_key: SecretString,
    api_base_url: String,
    timeout: Duration,
}

impl ClerkConfig {
    pub fn new(secret_key: SecretString) -> Self {
        Self {
            secret_key,
            api_base_url: "https://api.clerk.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct UpdateMetadataRequest<'a> {
    public_metadata: &'a BillingMetadata,
}

/// `IdentityProvider` backed by Clerk.
///
/// Constructed without a secret key, every call fails with
/// `IdentityError::NotConfigured`.
pub struct ClerkIdentityAdapter {
    config: Option<ClerkConfig>,
    http_client: reqwest::Client,
}

impl ClerkIdentityAdapter {
    pub fn new(config: ClerkConfig) -> Result<Self, IdentityError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        Ok(Self {
            config: Some(config),
            http_client,
        })
    }

    pub fn unconfigured() -> Self {
        Self {
            config: None,
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl IdentityProvider for ClerkIdentityAdapter {
    async fn update_billing_metadata(
        &self,
        user_id: &UserId,
        metadata: &BillingMetadata,
    ) -> Result<(), IdentityError> {
        let config = self.config.as_ref().ok_or(IdentityError::NotConfigured)?;
        let url = format!("{}/v1/users/{}/metadata", config.api_base_url, user_id);

        let response = self
            .http_client
            .patch(&url)
            .bearer_auth(config.secret_key.expose_secret())
            .json(&UpdateMetadataRequest {
                public_metadata: metadata,
            })
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let message = format!("Clerk returned {}: {}", status, body);
        if status.is_server_error() || status.as_u16() == 429 {
            Err(IdentityError::Unavailable(message))
        } else {
            Err(IdentityError::Rejected(message))
        }
    }
}
