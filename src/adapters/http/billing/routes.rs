//! Axum router configuration for billing endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use super::handlers::{
    create_checkout_session, get_billing_summary, get_current_user, handle_clerk_webhook,
    handle_stripe_webhook, health, BillingAppState,
};
use crate::adapters::http::middleware::auth_middleware;

/// Webhook routes, verified by signature rather than session.
///
/// # Routes
/// - `POST /stripe` - Stripe events
/// - `POST /clerk` - Clerk (Svix) events
pub fn webhook_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/stripe", post(handle_stripe_webhook))
        .route("/clerk", post(handle_clerk_webhook))
}

/// Routes that require a Bearer session token.
///
/// # Routes
/// - `POST /create-checkout-session` - Start hosted checkout
/// - `GET /billing` - Subscription and payment history
/// - `GET /user` - Caller identity
pub fn authenticated_routes(state: &BillingAppState) -> Router<BillingAppState> {
    Router::new()
        .route("/create-checkout-session", post(create_checkout_session))
        .route("/billing", get(get_billing_summary))
        .route("/user", get(get_current_user))
        .route_layer(middleware::from_fn_with_state(
            state.session_validator.clone(),
            auth_middleware,
        ))
}

/// Complete billing router, suitable for mounting at `/api`.
pub fn billing_router(state: &BillingAppState) -> Router<BillingAppState> {
    Router::new()
        .nest("/webhooks", webhook_routes())
        .merge(authenticated_routes(state))
        .route("/health", get(health))
}
