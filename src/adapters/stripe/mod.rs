//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` port for Stripe:
//! - Subscription retrieval for webhook reconciliation
//! - Hosted checkout sessions
//!
//! Webhook signature verification lives in the billing domain, since it is
//! pure computation over the raw body.

mod mock_payment_provider;
mod stripe_adapter;

pub use mock_payment_provider::{MethodCall, MockPaymentProvider};
pub use stripe_adapter::{StripeConfig, StripePaymentAdapter};
