//! Identity provider configuration (Clerk)

use secrecy::SecretString;
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Identity provider configuration.
///
/// Every secret is optional. Without `clerk_webhook_secret` the identity
/// webhook answers 500; without `clerk_secret_key` metadata sync is skipped;
/// without `clerk_jwt_key` Bearer-authenticated routes answer 401.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Svix signing secret for Clerk webhooks (`whsec_...`)
    pub clerk_webhook_secret: Option<String>,

    /// Clerk backend API secret key (`sk_...`)
    pub clerk_secret_key: Option<String>,

    /// PEM-encoded RS256 public key for session token verification
    pub clerk_jwt_key: Option<String>,

    /// Comma-separated list of accepted `azp` origins
    pub authorized_parties: Option<String>,

    /// Clerk backend API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl IdentityConfig {
    pub fn webhook_secret(&self) -> Option<SecretString> {
        non_blank(&self.clerk_webhook_secret).map(SecretString::new)
    }

    pub fn secret_key(&self) -> Option<SecretString> {
        non_blank(&self.clerk_secret_key).map(SecretString::new)
    }

    pub fn jwt_key(&self) -> Option<String> {
        non_blank(&self.clerk_jwt_key)
    }

    pub fn authorized_parties_list(&self) -> Vec<String> {
        self.authorized_parties
            .as_deref()
            .map(|s| {
                s.split(',')
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Validate identity configuration.
    ///
    /// In production the API base URL must be HTTPS.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if let Some(secret) = self.webhook_secret() {
            use secrecy::ExposeSecret;
            if !secret.expose_secret().starts_with("whsec_") {
                return Err(ValidationError::InvalidClerkWebhookSecret);
            }
        }
        if let Some(key) = non_blank(&self.clerk_secret_key) {
            if !key.starts_with("sk_") {
                return Err(ValidationError::InvalidClerkSecretKey);
            }
        }
        if let Some(pem) = self.jwt_key() {
            if !pem.contains("-----BEGIN PUBLIC KEY-----") {
                return Err(ValidationError::InvalidClerkJwtKey);
            }
        }
        if *environment == Environment::Production && !self.api_base_url.starts_with("https://") {
            return Err(ValidationError::MustBeHttps("IDENTITY__API_BASE_URL"));
        }
        Ok(())
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            clerk_webhook_secret: None,
            clerk_secret_key: None,
            clerk_jwt_key: None,
            authorized_parties: None,
            api_base_url: default_api_base_url(),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn default_api_base_url() -> String {
    "https://api.clerk.com".to_string()
}
