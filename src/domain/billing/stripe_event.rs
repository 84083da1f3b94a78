//! Payment-processor webhook envelope, payload shapes and classification.
//!
//! Only fields relevant to reconciliation are captured; everything else in
//! the processor's schema is ignored.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use super::subscription::{SubscriptionSnapshot, SubscriptionStatus};
use super::webhook_errors::WebhookError;
use crate::domain::foundation::{Timestamp, ValidationError};

/// Stripe webhook event envelope.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// Unique identifier for the event (evt_xxx format).
    #[serde(default)]
    pub id: String,

    /// Type of event (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    #[serde(default)]
    pub created: i64,

    /// Object containing event-specific data.
    pub data: StripeEventData,

    #[serde(default)]
    pub livemode: bool,

    #[serde(default)]
    pub api_version: Option<String>,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object that triggered the event (polymorphic based on event type).
    pub object: serde_json::Value,
}

impl StripeEvent {
    /// Attempts to deserialize the data object as the specified type.
    pub fn deserialize_object<T: serde::de::DeserializeOwned>(&self) -> Result<T, WebhookError> {
        T::deserialize(&self.data.object)
            .map_err(|e| WebhookError::ParseError(format!("{}: {}", self.event_type, e)))
    }
}

/// Event kinds the reconciler acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEventKind {
    CheckoutSessionCompleted,
    InvoicePaymentSucceeded,
    SubscriptionUpdated,
    SubscriptionDeleted,
}

impl PaymentEventKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "checkout.session.completed" => Some(Self::CheckoutSessionCompleted),
            "invoice.payment_succeeded" => Some(Self::InvoicePaymentSucceeded),
            "customer.subscription.updated" => Some(Self::SubscriptionUpdated),
            "customer.subscription.deleted" => Some(Self::SubscriptionDeleted),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckoutSessionCompleted => "checkout.session.completed",
            Self::InvoicePaymentSucceeded => "invoice.payment_succeeded",
            Self::SubscriptionUpdated => "customer.subscription.updated",
            Self::SubscriptionDeleted => "customer.subscription.deleted",
        }
    }
}

/// A classified processor event with its typed payload.
#[derive(Debug, Clone)]
pub enum PaymentEvent {
    CheckoutSessionCompleted(CheckoutSessionObject),
    InvoicePaymentSucceeded(InvoiceObject),
    SubscriptionUpdated(SubscriptionObject),
    SubscriptionDeleted(SubscriptionObject),
    /// Any other `type`; acknowledged and ignored.
    Unrecognized(String),
}

impl PaymentEvent {
    /// Maps a verified envelope to a closed event kind.
    ///
    /// A recognized kind whose payload does not decode is a `ParseError`.
    pub fn classify(event: &StripeEvent) -> Result<Self, WebhookError> {
        let Some(kind) = PaymentEventKind::parse(&event.event_type) else {
            return Ok(PaymentEvent::Unrecognized(event.event_type.clone()));
        };

        Ok(match kind {
            PaymentEventKind::CheckoutSessionCompleted => {
                PaymentEvent::CheckoutSessionCompleted(event.deserialize_object()?)
            }
            PaymentEventKind::InvoicePaymentSucceeded => {
                PaymentEvent::InvoicePaymentSucceeded(event.deserialize_object()?)
            }
            PaymentEventKind::SubscriptionUpdated => {
                PaymentEvent::SubscriptionUpdated(event.deserialize_object()?)
            }
            PaymentEventKind::SubscriptionDeleted => {
                PaymentEvent::SubscriptionDeleted(event.deserialize_object()?)
            }
        })
    }
}

/// `checkout.session` object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutSessionObject {
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "expandable_id")]
    pub customer: Option<String>,
    #[serde(default, deserialize_with = "expandable_id")]
    pub subscription: Option<String>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
    #[serde(default)]
    pub mode: Option<String>,
}

impl CheckoutSessionObject {
    /// Non-empty metadata value.
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get(key))
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// `invoice` object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceObject {
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "expandable_id")]
    pub customer: Option<String>,
    #[serde(default, deserialize_with = "expandable_id")]
    subscription: Option<String>,
    #[serde(default)]
    parent: Option<InvoiceParent>,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct InvoiceParent {
    #[serde(default)]
    subscription_details: Option<InvoiceSubscriptionDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct InvoiceSubscriptionDetails {
    #[serde(default, deserialize_with = "expandable_id")]
    subscription: Option<String>,
}

impl InvoiceObject {
    /// Subscription this invoice bills, from either API generation's field.
    pub fn subscription_id(&self) -> Option<&str> {
        self.subscription
            .as_deref()
            .or_else(|| {
                self.parent
                    .as_ref()
                    .and_then(|p| p.subscription_details.as_ref())
                    .and_then(|d| d.subscription.as_deref())
            })
            .filter(|s| !s.is_empty())
    }

    /// Invoice creation time, falling back to now.
    pub fn created_at(&self) -> Timestamp {
        self.created
            .and_then(Timestamp::from_unix_secs)
            .unwrap_or_else(Timestamp::now)
    }
}

/// `subscription` object, as sent in events and returned by the REST API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionObject {
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "expandable_id")]
    pub customer: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub items: Option<SubscriptionItems>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionItems {
    #[serde(default)]
    pub data: Vec<SubscriptionItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionItem {
    #[serde(default)]
    pub price: Option<PriceObject>,
    /// Newer API versions report the period per item.
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceObject {
    pub id: String,
}

impl SubscriptionObject {
    fn first_item(&self) -> Option<&SubscriptionItem> {
        self.items.as_ref().and_then(|items| items.data.first())
    }

    /// Converts the payload into the processor's authoritative view.
    pub fn snapshot(&self) -> Result<SubscriptionSnapshot, WebhookError> {
        let status: SubscriptionStatus = self
            .status
            .parse()
            .map_err(|e: ValidationError| WebhookError::ParseError(e.to_string()))?;

        let period_end_secs = self
            .current_period_end
            .or_else(|| self.first_item().and_then(|item| item.current_period_end))
            .ok_or(WebhookError::MissingField("current_period_end"))?;
        let current_period_end = Timestamp::from_unix_secs(period_end_secs)
            .ok_or_else(|| WebhookError::ParseError("current_period_end out of range".into()))?;

        Ok(SubscriptionSnapshot {
            id: self.id.clone(),
            customer_id: self.customer.clone(),
            status,
            price_id: self
                .first_item()
                .and_then(|item| item.price.as_ref())
                .map(|price| price.id.clone()),
            current_period_end,
        })
    }
}

/// Accepts either a bare id or an expanded object carrying an `id`.
fn expandable_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Expandable {
        Id(String),
        Object { id: String },
    }

    Ok(Option::<Expandable>::deserialize(deserializer)?.map(|value| match value {
        Expandable::Id(id) => id,
        Expandable::Object { id } => id,
    }))
}
