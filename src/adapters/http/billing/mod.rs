//! HTTP adapter for billing endpoints.
//!
//! - `POST /api/webhooks/stripe` - Stripe webhooks
//! - `POST /api/webhooks/clerk` - Clerk webhooks
//! - `POST /api/create-checkout-session` - Start hosted checkout
//! - `GET /api/billing` - Current subscription and payments
//! - `GET /api/user` - Authenticated caller
//! - `GET /api/health` - Liveness

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::BillingAppState;
pub use routes::billing_router;
