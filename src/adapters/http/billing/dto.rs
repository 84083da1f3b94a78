//! HTTP DTOs (Data Transfer Objects) for billing endpoints.
//!
//! Field names are camelCase to match the dashboard frontend.

use serde::{Deserialize, Serialize};

use crate::application::handlers::billing::{BillingSummary, CreateCheckoutSessionCommand};
use crate::domain::billing::{Payment, Subscription, SubscriptionStatus};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to start a hosted checkout.
///
/// Every field is optional at the JSON level so that a missing one becomes a
/// validation error naming the field, not a generic body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutSessionRequest {
    #[serde(default)]
    pub price_id: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub interval: Option<String>,
    #[serde(default)]
    pub success_url: Option<String>,
    #[serde(default)]
    pub cancel_url: Option<String>,
}

impl From<CreateCheckoutSessionRequest> for CreateCheckoutSessionCommand {
    fn from(request: CreateCheckoutSessionRequest) -> Self {
        Self {
            price_id: request.price_id,
            plan: request.plan,
            interval: request.interval,
            success_url: request.success_url,
            cancel_url: request.cancel_url,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Acknowledgement body for webhook deliveries.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookReceivedResponse {
    pub received: bool,
}

impl WebhookReceivedResponse {
    pub fn received() -> Self {
        Self { received: true }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSessionResponse {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub stripe_customer_id: String,
    pub stripe_subscription_id: String,
    pub stripe_price_id: String,
    pub plan: Option<String>,
    pub status: SubscriptionStatus,
    /// Whether the status grants access to paid features.
    pub active: bool,
    /// ISO 8601.
    pub current_period_end: String,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(subscription: Subscription) -> Self {
        Self {
            active: subscription.status.grants_access(),
            current_period_end: subscription.current_period_end.to_rfc3339(),
            stripe_customer_id: subscription.stripe_customer_id,
            stripe_subscription_id: subscription.stripe_subscription_id,
            stripe_price_id: subscription.stripe_price_id,
            plan: subscription.plan,
            status: subscription.status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: String,
    pub stripe_invoice_id: String,
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub created_at: String,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id.to_string(),
            stripe_invoice_id: payment.stripe_invoice_id,
            amount: payment.amount,
            currency: payment.currency,
            status: payment.status,
            created_at: payment.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BillingSummaryResponse {
    pub subscription: Option<SubscriptionResponse>,
    pub payments: Vec<PaymentResponse>,
}

impl From<BillingSummary> for BillingSummaryResponse {
    fn from(summary: BillingSummary) -> Self {
        Self {
            subscription: summary.subscription.map(SubscriptionResponse::from),
            payments: summary.payments.into_iter().map(PaymentResponse::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUserResponse {
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Standard error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Error code for programmatic handling.
    pub code: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}
