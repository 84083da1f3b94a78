//! Subscription repository port.
//!
//! Holds at most one subscription per user. `upsert` is the only write and
//! is the single serialization point for concurrent events on the same user:
//! implementations must apply it atomically at row level.

use async_trait::async_trait;

use super::record_store::UpsertResult;
use crate::domain::billing::{Subscription, SubscriptionUpsert};
use crate::domain::foundation::{DomainError, UserId};

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Update the user's row if present, otherwise create it when the change
    /// carries the full triad. Omitted fields keep their stored values.
    ///
    /// # Errors
    ///
    /// - `ReferencedUserMissing` if creating a row for an unknown user
    /// - `DatabaseError` on persistence failure
    async fn upsert(&self, change: &SubscriptionUpsert) -> Result<UpsertResult, DomainError>;

    /// Find the subscription for a user.
    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError>;

    /// Reverse lookup from a processor customer id to the owning user.
    async fn find_user_id_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<UserId>, DomainError>;
}
