//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the billing core to external systems:
//! - `postgres` - Record store (users, subscriptions, payments)
//! - `storage` - In-memory record store for tests and local runs
//! - `stripe` - Payment processor REST client
//! - `clerk` - Identity provider metadata sync
//! - `auth` - Session token validation
//! - `email` - Transactional email via Resend
//! - `http` - axum routes, middleware and router assembly

pub mod auth;
pub mod clerk;
pub mod email;
pub mod http;
pub mod postgres;
pub mod storage;
pub mod stripe;
