//! Subscription reconciliation rules.
//!
//! Pure functions from a classified processor event (plus the processor's
//! subscription snapshot where one is needed) to either a
//! `SubscriptionUpsert` or a reason the event cannot be reconciled.

use std::fmt;

use super::stripe_event::{CheckoutSessionObject, InvoiceObject, SubscriptionObject};
use super::subscription::{SubscriptionSnapshot, SubscriptionStatus, SubscriptionUpsert};
use crate::domain::foundation::UserId;

/// Metadata key carrying the internal user id on checkout sessions.
pub const USER_ID_METADATA_KEY: &str = "userId";
/// Metadata key carrying the plan name on checkout sessions.
pub const PLAN_METADATA_KEY: &str = "plan";

/// Why an event was acknowledged without touching the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unreconcilable {
    MissingUserMetadata,
    MissingSubscriptionReference,
    MissingCustomerReference,
    UnknownCustomer(String),
    /// The user named in checkout metadata has no stored record (e.g. already deleted).
    UnknownUser(UserId),
    /// The row to update is gone and the change cannot recreate it.
    NoSubscriptionRow(UserId),
}

impl fmt::Display for Unreconcilable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unreconcilable::MissingUserMetadata => write!(f, "missing userId metadata"),
            Unreconcilable::MissingSubscriptionReference => write!(f, "missing subscription reference"),
            Unreconcilable::MissingCustomerReference => write!(f, "missing customer reference"),
            Unreconcilable::UnknownCustomer(id) => write!(f, "no user for customer {}", id),
            Unreconcilable::UnknownUser(user) => write!(f, "no stored user {}", user),
            Unreconcilable::NoSubscriptionRow(user) => {
                write!(f, "no subscription row for user {}", user)
            }
        }
    }
}

/// References a completed checkout must carry before anything is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRefs {
    pub user_id: UserId,
    pub customer_id: String,
    pub subscription_id: String,
    pub plan: Option<String>,
}

/// Checks checkout-completion preconditions.
pub fn checkout_refs(session: &CheckoutSessionObject) -> Result<CheckoutRefs, Unreconcilable> {
    let subscription_id = session
        .subscription
        .clone()
        .filter(|s| !s.is_empty())
        .ok_or(Unreconcilable::MissingSubscriptionReference)?;
    let customer_id = session
        .customer
        .clone()
        .filter(|c| !c.is_empty())
        .ok_or(Unreconcilable::MissingCustomerReference)?;
    let user_id = session
        .metadata_value(USER_ID_METADATA_KEY)
        .and_then(|id| UserId::new(id).ok())
        .ok_or(Unreconcilable::MissingUserMetadata)?;

    Ok(CheckoutRefs {
        user_id,
        customer_id,
        subscription_id,
        plan: session.metadata_value(PLAN_METADATA_KEY).map(String::from),
    })
}

/// Full upsert from a completed checkout and the fetched subscription.
pub fn checkout_upsert(refs: CheckoutRefs, snapshot: &SubscriptionSnapshot) -> SubscriptionUpsert {
    SubscriptionUpsert {
        user_id: refs.user_id,
        stripe_customer_id: Some(refs.customer_id),
        stripe_subscription_id: Some(refs.subscription_id),
        stripe_price_id: snapshot.price_id.clone(),
        plan: refs.plan,
        status: snapshot.status,
        current_period_end: snapshot.current_period_end,
    }
}

/// Customer reference a subscription lifecycle event must carry.
pub fn subscription_customer(subscription: &SubscriptionObject) -> Result<&str, Unreconcilable> {
    subscription
        .customer
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or(Unreconcilable::MissingCustomerReference)
}

/// Subscription and customer an invoice must reference.
pub fn invoice_refs(invoice: &InvoiceObject) -> Result<(&str, &str), Unreconcilable> {
    let subscription_id = invoice
        .subscription_id()
        .ok_or(Unreconcilable::MissingSubscriptionReference)?;
    let customer_id = invoice
        .customer
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or(Unreconcilable::MissingCustomerReference)?;
    Ok((subscription_id, customer_id))
}

/// Renewal or status change: period end and status only.
pub fn period_update(user_id: UserId, snapshot: &SubscriptionSnapshot) -> SubscriptionUpsert {
    SubscriptionUpsert::status_only(user_id, snapshot.status, snapshot.current_period_end)
}

/// Deletion: terminal status with the final period end.
///
/// A non-terminal status on a deletion event is recorded as canceled.
pub fn cancellation(user_id: UserId, snapshot: &SubscriptionSnapshot) -> SubscriptionUpsert {
    let status = if snapshot.status.is_terminal() {
        snapshot.status
    } else {
        SubscriptionStatus::Canceled
    };
    SubscriptionUpsert::status_only(user_id, status, snapshot.current_period_end)
}
