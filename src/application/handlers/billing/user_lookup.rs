//! Resolves processor customer ids to internal user ids.
//!
//! Recurring processor events carry no user metadata, only the customer id.
//! The customer id is persisted on the subscription row at checkout
//! completion, so the stored row is the only source consulted here.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, UserId};
use crate::ports::SubscriptionRepository;

#[derive(Clone)]
pub struct UserLookupBridge {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl UserLookupBridge {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }

    /// `Ok(None)` when no stored subscription carries this customer id.
    pub async fn resolve(&self, customer_id: &str) -> Result<Option<UserId>, DomainError> {
        if customer_id.trim().is_empty() {
            return Ok(None);
        }
        self.subscriptions
            .find_user_id_by_customer_id(customer_id)
            .await
    }
}
