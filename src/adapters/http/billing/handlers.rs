//! HTTP handlers for billing endpoints.
//!
//! These handlers connect Axum routes to the billing command/query handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::adapters::http::middleware::{AuthState, RequireAuth};
use crate::application::handlers::billing::{
    CreateCheckoutSessionHandler, GetBillingSummaryHandler, HandleIdentityWebhookCommand,
    HandleIdentityWebhookHandler, HandlePaymentWebhookCommand, HandlePaymentWebhookHandler,
    STRIPE_SIGNATURE_HEADER,
};
use crate::domain::billing::{StripeWebhookVerifier, SvixHeaders, SvixWebhookVerifier, WebhookError};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{
    EmailSender, IdentityProvider, PaymentProvider, PaymentRepository, SubscriptionRepository,
    UserRepository,
};

use super::dto::{
    BillingSummaryResponse, CheckoutSessionResponse, CreateCheckoutSessionRequest,
    CurrentUserResponse, ErrorResponse, HealthResponse, WebhookReceivedResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned per request; every dependency is Arc-wrapped.
#[derive(Clone)]
pub struct BillingAppState {
    pub stripe_verifier: Arc<StripeWebhookVerifier>,
    /// `None` when no Clerk signing secret is configured.
    pub clerk_verifier: Option<Arc<SvixWebhookVerifier>>,
    pub user_repository: Arc<dyn UserRepository>,
    pub subscription_repository: Arc<dyn SubscriptionRepository>,
    pub payment_repository: Arc<dyn PaymentRepository>,
    pub payment_provider: Arc<dyn PaymentProvider>,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub email_sender: Arc<dyn EmailSender>,
    pub session_validator: AuthState,
}

impl BillingAppState {
    pub fn payment_webhook_handler(&self) -> HandlePaymentWebhookHandler {
        HandlePaymentWebhookHandler::new(
            self.stripe_verifier.clone(),
            self.user_repository.clone(),
            self.subscription_repository.clone(),
            self.payment_repository.clone(),
            self.payment_provider.clone(),
            self.identity_provider.clone(),
            self.email_sender.clone(),
        )
    }

    pub fn identity_webhook_handler(&self) -> HandleIdentityWebhookHandler {
        HandleIdentityWebhookHandler::new(
            self.clerk_verifier.clone(),
            self.user_repository.clone(),
            self.email_sender.clone(),
        )
    }

    pub fn checkout_handler(&self) -> CreateCheckoutSessionHandler {
        CreateCheckoutSessionHandler::new(self.payment_provider.clone())
    }

    pub fn billing_summary_handler(&self) -> GetBillingSummaryHandler {
        GetBillingSummaryHandler::new(
            self.subscription_repository.clone(),
            self.payment_repository.clone(),
        )
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook Handlers (signature verified, no session auth)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/stripe - Handle Stripe webhook events
pub async fn handle_stripe_webhook(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookReceivedResponse>, WebhookApiError> {
    let cmd = HandlePaymentWebhookCommand {
        payload: body.to_vec(),
        signature: header_value(&headers, STRIPE_SIGNATURE_HEADER),
    };

    state.payment_webhook_handler().handle(cmd).await?;
    Ok(Json(WebhookReceivedResponse::received()))
}

/// POST /api/webhooks/clerk - Handle Clerk (Svix-signed) webhook events
pub async fn handle_clerk_webhook(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookReceivedResponse>, WebhookApiError> {
    let cmd = HandleIdentityWebhookCommand {
        payload: body.to_vec(),
        svix_id: header_value(&headers, SvixHeaders::ID),
        svix_timestamp: header_value(&headers, SvixHeaders::TIMESTAMP),
        svix_signature: header_value(&headers, SvixHeaders::SIGNATURE),
    };

    state.identity_webhook_handler().handle(cmd).await?;
    Ok(Json(WebhookReceivedResponse::received()))
}

// ════════════════════════════════════════════════════════════════════════════════
// Authenticated Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/create-checkout-session - Start a hosted subscription checkout
pub async fn create_checkout_session(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
    body: Bytes,
) -> Result<impl IntoResponse, BillingApiError> {
    let request: CreateCheckoutSessionRequest = serde_json::from_slice(&body).map_err(|e| {
        DomainError::new(ErrorCode::InvalidFormat, format!("Invalid request body: {}", e))
    })?;

    let result = state
        .checkout_handler()
        .handle(user.id, request.into())
        .await?;

    Ok(Json(CheckoutSessionResponse { url: result.url }))
}

/// GET /api/billing - Current subscription and payment history
pub async fn get_billing_summary(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, BillingApiError> {
    let summary = state.billing_summary_handler().handle(&user.id).await?;
    Ok(Json(BillingSummaryResponse::from(summary)))
}

/// GET /api/user - Identity of the authenticated caller
pub async fn get_current_user(RequireAuth(user): RequireAuth) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse {
        user_id: user.id.to_string(),
    })
}

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// Converts webhook failures into the status the sender's retry logic expects.
#[derive(Debug)]
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status == StatusCode::OK {
            return Json(WebhookReceivedResponse::received()).into_response();
        }

        // Internal details stay in the logs
        let message = if status.is_server_error() {
            "Webhook processing failed".to_string()
        } else {
            self.0.to_string()
        };
        let body = ErrorResponse::new(self.0.code(), message);
        (status, Json(body)).into_response()
    }
}

/// API error type that converts domain errors to HTTP responses.
#[derive(Debug)]
pub struct BillingApiError(DomainError);

impl From<DomainError> for BillingApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> Response {
        let status = match self.0.code {
            ErrorCode::ValidationFailed | ErrorCode::EmptyField | ErrorCode::InvalidFormat => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::UserNotFound | ErrorCode::SubscriptionNotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if status.is_server_error() {
            tracing::error!(code = %self.0.code, error = %self.0.message, "Billing request failed");
            "Internal server error".to_string()
        } else {
            self.0.message.clone()
        };
        let body = ErrorResponse::new(self.0.code.to_string(), message);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn ignored_webhook_error_is_acknowledged() {
        let response =
            WebhookApiError::from(WebhookError::Ignored("ping".into())).into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!({"received": true}));
    }

    #[tokio::test]
    async fn signature_failure_is_bad_request_with_code() {
        let response = WebhookApiError::from(WebhookError::InvalidSignature).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "INVALID_SIGNATURE");
    }

    #[tokio::test]
    async fn database_failure_hides_details() {
        let response =
            WebhookApiError::from(WebhookError::Database("connection reset".into())).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["code"], "DATABASE_ERROR");
        assert!(!body["error"].as_str().unwrap().contains("connection reset"));
    }

    #[tokio::test]
    async fn missing_checkout_field_is_bad_request() {
        let err = DomainError::new(ErrorCode::EmptyField, "Field 'priceId' cannot be empty");

        let response = BillingApiError::from(err).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "EMPTY_FIELD");
    }

    #[tokio::test]
    async fn provider_failure_is_internal_error() {
        let err = DomainError::new(ErrorCode::PaymentProviderError, "stripe down");

        let response = BillingApiError::from(err).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
