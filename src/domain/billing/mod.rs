//! Billing domain: users, subscriptions, payments and the webhook events that
//! drive them.

mod identity_event;
mod payment;
pub mod reconciler;
mod stripe_event;
mod subscription;
mod svix_verifier;
mod user;
mod webhook_errors;
mod webhook_verifier;

pub use identity_event::{DeletedUserData, EmailAddress, IdentityEnvelope, IdentityEvent, IdentityUserData};
pub use payment::Payment;
pub use reconciler::{CheckoutRefs, Unreconcilable};
pub use stripe_event::{
    CheckoutSessionObject, InvoiceObject, PaymentEvent, PaymentEventKind, PriceObject,
    StripeEvent, StripeEventData, SubscriptionItem, SubscriptionItems, SubscriptionObject,
};
pub use subscription::{Subscription, SubscriptionSnapshot, SubscriptionStatus, SubscriptionUpsert};
pub use svix_verifier::{SvixHeaders, SvixWebhookVerifier};
pub use user::User;
pub use webhook_errors::WebhookError;
pub use webhook_verifier::{SignatureHeader, StripeWebhookVerifier};

#[cfg(test)]
pub(crate) use svix_verifier::sign_svix_payload;
#[cfg(test)]
pub(crate) use webhook_verifier::sign_stripe_payload;
