//! GetBillingSummaryHandler - Query for the caller's subscription and payments.

use std::sync::Arc;

use crate::domain::billing::{Payment, Subscription};
use crate::domain::foundation::{DomainError, UserId};
use crate::ports::{PaymentRepository, SubscriptionRepository};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingSummary {
    pub subscription: Option<Subscription>,
    /// Newest first.
    pub payments: Vec<Payment>,
}

pub struct GetBillingSummaryHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    payments: Arc<dyn PaymentRepository>,
}

impl GetBillingSummaryHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        payments: Arc<dyn PaymentRepository>,
    ) -> Self {
        Self {
            subscriptions,
            payments,
        }
    }

    pub async fn handle(&self, user_id: &UserId) -> Result<BillingSummary, DomainError> {
        let (subscription, payments) = futures::try_join!(
            self.subscriptions.find_by_user_id(user_id),
            self.payments.list_by_user(user_id),
        )?;
        Ok(BillingSummary {
            subscription,
            payments,
        })
    }
}
