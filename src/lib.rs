//! Aionyx Billing - Webhook-driven subscription reconciliation
//!
//! This crate keeps local user, subscription and payment records in step with
//! Stripe and Clerk by reconciling their at-least-once, out-of-order webhook
//! deliveries, and serves the small authenticated billing API around them.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
