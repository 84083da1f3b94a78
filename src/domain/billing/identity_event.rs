//! Identity-provider webhook envelope and classification.

use serde::Deserialize;

use super::user::User;
use super::webhook_errors::WebhookError;
use crate::domain::foundation::{Timestamp, UserId};

/// Identity webhook envelope: `{ "type": ..., "data": {...} }`.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityEnvelope {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// A classified identity event.
#[derive(Debug, Clone)]
pub enum IdentityEvent {
    UserCreated(IdentityUserData),
    /// Accepted but not acted on; profile edits are not mirrored.
    UserUpdated,
    UserDeleted(DeletedUserData),
    Unrecognized(String),
}

impl IdentityEvent {
    pub fn classify(envelope: &IdentityEnvelope) -> Result<Self, WebhookError> {
        let decode = |what: &str| -> WebhookError {
            WebhookError::ParseError(format!("{} payload", what))
        };

        Ok(match envelope.event_type.as_str() {
            "user.created" => IdentityEvent::UserCreated(
                IdentityUserData::deserialize(&envelope.data).map_err(|_| decode("user.created"))?,
            ),
            "user.updated" => IdentityEvent::UserUpdated,
            "user.deleted" => IdentityEvent::UserDeleted(
                DeletedUserData::deserialize(&envelope.data).map_err(|_| decode("user.deleted"))?,
            ),
            other => IdentityEvent::Unrecognized(other.to_string()),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailAddress {
    #[serde(default)]
    pub id: Option<String>,
    pub email_address: String,
}

/// `user` object sent with `user.created`.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityUserData {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    pub primary_email_address_id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Milliseconds since the epoch.
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl IdentityUserData {
    /// Primary address when flagged, otherwise the first one listed.
    pub fn primary_email(&self) -> Option<&str> {
        let flagged = self.primary_email_address_id.as_deref().and_then(|primary| {
            self.email_addresses
                .iter()
                .find(|address| address.id.as_deref() == Some(primary))
        });
        flagged
            .or_else(|| self.email_addresses.first())
            .map(|address| address.email_address.as_str())
    }

    pub fn to_user(&self) -> Result<User, WebhookError> {
        let id = UserId::new(self.id.clone()).map_err(|_| WebhookError::MissingField("data.id"))?;
        Ok(User {
            id,
            email: self.primary_email().map(String::from),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            image_url: self.image_url.clone(),
            created_at: self
                .created_at
                .and_then(Timestamp::from_unix_millis)
                .unwrap_or_else(Timestamp::now),
        })
    }
}

/// Tombstone sent with `user.deleted`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeletedUserData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub deleted: Option<bool>,
}

impl DeletedUserData {
    pub fn user_id(&self) -> Result<UserId, WebhookError> {
        self.id
            .clone()
            .and_then(|id| UserId::new(id).ok())
            .ok_or(WebhookError::MissingField("data.id"))
    }
}
