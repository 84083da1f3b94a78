//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Record Store Ports
//!
//! - `UserRepository` - Identity records, cascading delete
//! - `SubscriptionRepository` - One subscription per user, upsert + reverse lookup
//! - `PaymentRepository` - Append-only payment ledger
//!
//! ## Collaborator Ports
//!
//! - `PaymentProvider` - Subscription fetch and hosted checkout
//! - `IdentityProvider` - User metadata sync
//! - `EmailSender` - Best-effort notifications
//! - `SessionValidator` - Bearer token validation

mod email_sender;
mod identity_provider;
mod payment_provider;
mod payment_repository;
mod record_store;
mod session_validator;
mod subscription_repository;
mod user_repository;

pub use email_sender::{EmailError, EmailSender, PaymentConfirmationEmail, WelcomeEmail};
pub use identity_provider::{BillingMetadata, IdentityError, IdentityProvider};
pub use payment_provider::{
    CheckoutSession, CreateCheckoutRequest, PaymentError, PaymentErrorCode, PaymentProvider,
};
pub use payment_repository::PaymentRepository;
pub use record_store::{SaveResult, UpsertResult};
pub use session_validator::SessionValidator;
pub use subscription_repository::SubscriptionRepository;
pub use user_repository::UserRepository;
