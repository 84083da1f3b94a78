//! Identity provider port.
//!
//! Used to mirror billing state into the provider's user metadata so that
//! front ends reading the session can see the plan without a round trip.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::domain::billing::SubscriptionStatus;
use crate::domain::foundation::UserId;

/// Billing fields written to the user's public metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingMetadata {
    pub plan: Option<String>,
    pub subscription_status: SubscriptionStatus,
}

#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    #[error("Identity provider not configured")]
    NotConfigured,

    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),

    #[error("Identity provider rejected request: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Merge billing fields into the user's public metadata.
    async fn update_billing_metadata(
        &self,
        user_id: &UserId,
        metadata: &BillingMetadata,
    ) -> Result<(), IdentityError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_provider_is_object_safe() {
        fn _accepts_dyn(_provider: &dyn IdentityProvider) {}
    }

    #[test]
    fn billing_metadata_serializes_camel_case() {
        let metadata = BillingMetadata {
            plan: Some("pro".into()),
            subscription_status: SubscriptionStatus::Active,
        };
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["plan"], "pro");
        assert_eq!(json["subscriptionStatus"], "active");
    }
}
