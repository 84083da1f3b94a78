//! Billing handlers: webhook reconciliation plus the authenticated
//! checkout and billing-summary operations.

mod create_checkout_session;
mod get_billing_summary;
mod handle_identity_webhook;
mod handle_payment_webhook;
mod user_lookup;

#[cfg(test)]
pub(crate) mod testing;

pub use create_checkout_session::{
    CreateCheckoutSessionCommand, CreateCheckoutSessionHandler, CreateCheckoutSessionResult,
};
pub use get_billing_summary::{BillingSummary, GetBillingSummaryHandler};
pub use handle_identity_webhook::{
    HandleIdentityWebhookCommand, HandleIdentityWebhookHandler, IdentityWebhookOutcome,
};
pub use handle_payment_webhook::{
    HandlePaymentWebhookCommand, HandlePaymentWebhookHandler, PaymentWebhookOutcome,
    STRIPE_SIGNATURE_HEADER,
};
pub use user_lookup::UserLookupBridge;
