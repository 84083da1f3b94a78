//! Subscription record and the upsert rule that keeps it converged.
//!
//! A `Subscription` row is keyed by user. It comes into existence only once a
//! change carries the full processor triad (customer, subscription, price);
//! later changes may omit any of those and the stored values are kept.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId, ValidationError};

/// Processor subscription status vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Trialing,
    Canceled,
    Incomplete,
    IncompleteExpired,
    Unpaid,
    Paused,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Incomplete => "incomplete",
            SubscriptionStatus::IncompleteExpired => "incomplete_expired",
            SubscriptionStatus::Unpaid => "unpaid",
            SubscriptionStatus::Paused => "paused",
        }
    }

    /// Statuses after which the processor never bills again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Canceled | SubscriptionStatus::IncompleteExpired
        )
    }

    /// Statuses under which paid features are available.
    pub fn grants_access(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Trialing)
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "past_due" => Ok(SubscriptionStatus::PastDue),
            "trialing" => Ok(SubscriptionStatus::Trialing),
            // Older API versions spell it with two l's.
            "canceled" | "cancelled" => Ok(SubscriptionStatus::Canceled),
            "incomplete" => Ok(SubscriptionStatus::Incomplete),
            "incomplete_expired" => Ok(SubscriptionStatus::IncompleteExpired),
            "unpaid" => Ok(SubscriptionStatus::Unpaid),
            "paused" => Ok(SubscriptionStatus::Paused),
            other => Err(ValidationError::unknown_value("status", other)),
        }
    }
}

/// Stored subscription row, one per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub user_id: UserId,
    pub stripe_customer_id: String,
    pub stripe_subscription_id: String,
    pub stripe_price_id: String,
    pub plan: Option<String>,
    pub status: SubscriptionStatus,
    pub current_period_end: Timestamp,
}

/// The processor's authoritative view of a subscription.
///
/// Produced either by fetching the subscription from the processor or by
/// decoding a subscription object carried in an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSnapshot {
    pub id: String,
    pub customer_id: Option<String>,
    pub status: SubscriptionStatus,
    pub price_id: Option<String>,
    pub current_period_end: Timestamp,
}

/// A change to apply to a user's subscription row.
///
/// `None` fields are left untouched on an existing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionUpsert {
    pub user_id: UserId,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub stripe_price_id: Option<String>,
    pub plan: Option<String>,
    pub status: SubscriptionStatus,
    pub current_period_end: Timestamp,
}

impl SubscriptionUpsert {
    /// A change that touches only status and period end.
    pub fn status_only(
        user_id: UserId,
        status: SubscriptionStatus,
        current_period_end: Timestamp,
    ) -> Self {
        Self {
            user_id,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            stripe_price_id: None,
            plan: None,
            status,
            current_period_end,
        }
    }

    /// True when the change carries enough to create a row from nothing.
    pub fn can_create(&self) -> bool {
        self.stripe_customer_id.is_some()
            && self.stripe_subscription_id.is_some()
            && self.stripe_price_id.is_some()
    }

    /// Applies this change to the current row, if any.
    ///
    /// Returns `None` when there is no row and the change cannot create one.
    pub fn apply(&self, existing: Option<&Subscription>) -> Option<Subscription> {
        match existing {
            Some(current) => Some(Subscription {
                user_id: current.user_id.clone(),
                stripe_customer_id: self
                    .stripe_customer_id
                    .clone()
                    .unwrap_or_else(|| current.stripe_customer_id.clone()),
                stripe_subscription_id: self
                    .stripe_subscription_id
                    .clone()
                    .unwrap_or_else(|| current.stripe_subscription_id.clone()),
                stripe_price_id: self
                    .stripe_price_id
                    .clone()
                    .unwrap_or_else(|| current.stripe_price_id.clone()),
                plan: self.plan.clone().or_else(|| current.plan.clone()),
                status: self.status,
                current_period_end: self.current_period_end,
            }),
            None => Some(Subscription {
                user_id: self.user_id.clone(),
                stripe_customer_id: self.stripe_customer_id.clone()?,
                stripe_subscription_id: self.stripe_subscription_id.clone()?,
                stripe_price_id: self.stripe_price_id.clone()?,
                plan: self.plan.clone(),
                status: self.status,
                current_period_end: self.current_period_end,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn period_end(secs: i64) -> Timestamp {
        Timestamp::from_unix_secs(secs).unwrap()
    }

    fn full_upsert() -> SubscriptionUpsert {
        SubscriptionUpsert {
            user_id: UserId::new("u1").unwrap(),
            stripe_customer_id: Some("cus_1".into()),
            stripe_subscription_id: Some("sub_1".into()),
            stripe_price_id: Some("price_basic".into()),
            plan: Some("basic".into()),
            status: SubscriptionStatus::Active,
            current_period_end: period_end(1_700_000_000),
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Status Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn status_parses_processor_vocabulary() {
        for s in [
            "active",
            "past_due",
            "trialing",
            "canceled",
            "incomplete",
            "incomplete_expired",
            "unpaid",
            "paused",
        ] {
            let status: SubscriptionStatus = s.parse().unwrap();
            assert_eq!(status.as_str(), s);
        }
    }

    #[test]
    fn status_accepts_british_cancelled() {
        assert_eq!(
            "cancelled".parse::<SubscriptionStatus>().unwrap(),
            SubscriptionStatus::Canceled
        );
    }

    #[test]
    fn status_rejects_unknown_value() {
        assert!(matches!(
            "frozen".parse::<SubscriptionStatus>(),
            Err(ValidationError::UnknownValue { .. })
        ));
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&SubscriptionStatus::PastDue).unwrap(),
            "\"past_due\""
        );
    }

    #[test]
    fn terminal_and_access_flags() {
        assert!(SubscriptionStatus::Canceled.is_terminal());
        assert!(SubscriptionStatus::IncompleteExpired.is_terminal());
        assert!(!SubscriptionStatus::PastDue.is_terminal());
        assert!(SubscriptionStatus::Trialing.grants_access());
        assert!(!SubscriptionStatus::Unpaid.grants_access());
    }

    // ══════════════════════════════════════════════════════════════
    // Upsert Rule Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn full_change_creates_row() {
        let row = full_upsert().apply(None).unwrap();

        assert_eq!(row.user_id.as_str(), "u1");
        assert_eq!(row.stripe_customer_id, "cus_1");
        assert_eq!(row.stripe_subscription_id, "sub_1");
        assert_eq!(row.stripe_price_id, "price_basic");
        assert_eq!(row.status, SubscriptionStatus::Active);
        assert_eq!(row.current_period_end.to_rfc3339(), "2023-11-14T22:13:20Z");
    }

    #[test]
    fn status_only_change_cannot_create_row() {
        let change = SubscriptionUpsert::status_only(
            UserId::new("u1").unwrap(),
            SubscriptionStatus::Active,
            period_end(1),
        );

        assert!(!change.can_create());
        assert!(change.apply(None).is_none());
    }

    #[test]
    fn status_only_change_preserves_stored_fields() {
        let existing = full_upsert().apply(None).unwrap();
        let change = SubscriptionUpsert::status_only(
            UserId::new("u1").unwrap(),
            SubscriptionStatus::PastDue,
            period_end(1_800_000_000),
        );

        let row = change.apply(Some(&existing)).unwrap();

        assert_eq!(row.stripe_customer_id, "cus_1");
        assert_eq!(row.stripe_price_id, "price_basic");
        assert_eq!(row.plan.as_deref(), Some("basic"));
        assert_eq!(row.status, SubscriptionStatus::PastDue);
        assert_eq!(row.current_period_end, period_end(1_800_000_000));
    }

    #[test]
    fn applying_same_change_twice_is_idempotent() {
        let change = full_upsert();
        let once = change.apply(None).unwrap();
        let twice = change.apply(Some(&once)).unwrap();

        assert_eq!(once, twice);
    }

    proptest! {
        #[test]
        fn omitted_fields_always_preserved(
            price in proptest::option::of("price_[a-z]{1,8}"),
            plan in proptest::option::of("[a-z]{1,8}"),
            secs in 0i64..4_000_000_000,
        ) {
            let existing = full_upsert().apply(None).unwrap();
            let change = SubscriptionUpsert {
                stripe_customer_id: None,
                stripe_subscription_id: None,
                stripe_price_id: price.clone(),
                plan: plan.clone(),
                status: SubscriptionStatus::Unpaid,
                current_period_end: period_end(secs),
                ..full_upsert()
            };

            let row = change.apply(Some(&existing)).unwrap();

            prop_assert_eq!(row.stripe_customer_id.as_str(), "cus_1");
            prop_assert_eq!(row.stripe_subscription_id.as_str(), "sub_1");
            prop_assert_eq!(row.stripe_price_id, price.unwrap_or_else(|| "price_basic".into()));
            prop_assert_eq!(row.plan, plan.or_else(|| Some("basic".into())));
            prop_assert_eq!(row.current_period_end, period_end(secs));
        }
    }
}
