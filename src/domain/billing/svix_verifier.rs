//! Identity-provider (Svix-format) webhook signature verification.
//!
//! The sender signs `"{svix-id}.{svix-timestamp}.{raw body}"` with
//! HMAC-SHA256 keyed by the base64 part of a `whsec_` secret, and sends one or
//! more space-separated `v1,<base64 signature>` entries in `svix-signature`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::identity_event::IdentityEnvelope;
use super::webhook_errors::WebhookError;
use super::webhook_verifier::{constant_time_compare, validate_timestamp};

const SECRET_PREFIX: &str = "whsec_";

/// The three signature headers, all required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvixHeaders {
    pub id: String,
    pub timestamp: String,
    pub signature: String,
}

impl SvixHeaders {
    pub const ID: &'static str = "svix-id";
    pub const TIMESTAMP: &'static str = "svix-timestamp";
    pub const SIGNATURE: &'static str = "svix-signature";

    /// Collects the headers, failing with `MissingHeaders` on the first absent one.
    pub fn new(
        id: Option<&str>,
        timestamp: Option<&str>,
        signature: Option<&str>,
    ) -> Result<Self, WebhookError> {
        let id = id.filter(|v| !v.is_empty()).ok_or(WebhookError::MissingHeaders(Self::ID))?;
        let timestamp = timestamp
            .filter(|v| !v.is_empty())
            .ok_or(WebhookError::MissingHeaders(Self::TIMESTAMP))?;
        let signature = signature
            .filter(|v| !v.is_empty())
            .ok_or(WebhookError::MissingHeaders(Self::SIGNATURE))?;

        Ok(Self {
            id: id.to_string(),
            timestamp: timestamp.to_string(),
            signature: signature.to_string(),
        })
    }
}

/// Verifier for identity-provider webhook signatures.
pub struct SvixWebhookVerifier {
    key: Vec<u8>,
}

impl SvixWebhookVerifier {
    /// Builds a verifier from a `whsec_<base64>` signing secret.
    ///
    /// A secret without the prefix is decoded as-is.
    pub fn new(secret: &str) -> Result<Self, WebhookError> {
        let encoded = secret.strip_prefix(SECRET_PREFIX).unwrap_or(secret);
        let key = STANDARD
            .decode(encoded)
            .map_err(|_| WebhookError::Misconfigured("identity webhook secret is not base64"))?;
        if key.is_empty() {
            return Err(WebhookError::Misconfigured("identity webhook secret is empty"));
        }
        Ok(Self { key })
    }

    /// Verifies against the current time and parses the envelope.
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        headers: &SvixHeaders,
    ) -> Result<IdentityEnvelope, WebhookError> {
        self.verify_and_parse_at(payload, headers, chrono::Utc::now().timestamp())
    }

    /// Verifies as of `now` (unix seconds) and parses the envelope.
    pub fn verify_and_parse_at(
        &self,
        payload: &[u8],
        headers: &SvixHeaders,
        now: i64,
    ) -> Result<IdentityEnvelope, WebhookError> {
        let timestamp: i64 = headers
            .timestamp
            .trim()
            .parse()
            .map_err(|_| WebhookError::InvalidTimestamp)?;
        validate_timestamp(timestamp, now)?;

        let expected = self.compute_signature(&headers.id, &headers.timestamp, payload)?;

        let matched = headers
            .signature
            .split_whitespace()
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == "v1")
            .filter_map(|(_, sig)| STANDARD.decode(sig).ok())
            .any(|candidate| constant_time_compare(&expected, &candidate));

        if !matched {
            return Err(WebhookError::InvalidSignature);
        }

        serde_json::from_slice(payload).map_err(|e| WebhookError::ParseError(e.to_string()))
    }

    fn compute_signature(
        &self,
        id: &str,
        timestamp: &str,
        payload: &[u8],
    ) -> Result<Vec<u8>, WebhookError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.key)
            .map_err(|_| WebhookError::Misconfigured("identity webhook secret"))?;
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

/// Builds an `svix-signature` header value for test fixtures.
#[cfg(test)]
pub fn sign_svix_payload(secret: &str, id: &str, timestamp: i64, body: &str) -> String {
    let key = STANDARD
        .decode(secret.trim_start_matches(SECRET_PREFIX))
        .expect("test secret is base64");
    let mut mac = Hmac::<Sha256>::new_from_slice(&key).expect("HMAC accepts any key");
    mac.update(format!("{}.{}.{}", id, timestamp, body).as_bytes());
    format!("v1,{}", STANDARD.encode(mac.finalize().into_bytes()))
}
