//! Payment ledger port.

use async_trait::async_trait;

use super::record_store::SaveResult;
use crate::domain::billing::Payment;
use crate::domain::foundation::{DomainError, UserId};

/// Append-only ledger keyed by processor invoice id.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Append a payment; a second append for the same invoice is `AlreadyExists`.
    async fn append(&self, payment: &Payment) -> Result<SaveResult, DomainError>;

    /// Payments for a user, newest first.
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Payment>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn PaymentRepository) {}
    }
}
