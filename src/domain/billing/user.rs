//! User identity record mirrored from the identity provider.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId};

/// Locally persisted identity record.
///
/// Created on an identity-provider "created" event and removed, together with
/// its subscription and payments, on a "deleted" event. Never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Primary email; phone-only accounts have none.
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
    pub created_at: Timestamp,
}

impl User {
    /// Name used to greet the user in notifications.
    pub fn greeting_name(&self) -> &str {
        self.first_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or("there")
    }
}
