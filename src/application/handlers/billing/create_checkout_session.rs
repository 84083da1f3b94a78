//! CreateCheckoutSessionHandler - Starts a hosted subscription checkout.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, UserId, ValidationError};
use crate::ports::{CreateCheckoutRequest, PaymentProvider};

/// Command to create a checkout session for the authenticated caller.
///
/// Fields arrive straight from the request body; all five are required.
#[derive(Debug, Clone, Default)]
pub struct CreateCheckoutSessionCommand {
    pub price_id: Option<String>,
    pub plan: Option<String>,
    pub interval: Option<String>,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCheckoutSessionResult {
    pub session_id: String,
    pub url: String,
}

pub struct CreateCheckoutSessionHandler {
    payment_provider: Arc<dyn PaymentProvider>,
}

impl CreateCheckoutSessionHandler {
    pub fn new(payment_provider: Arc<dyn PaymentProvider>) -> Self {
        Self { payment_provider }
    }

    pub async fn handle(
        &self,
        user_id: UserId,
        cmd: CreateCheckoutSessionCommand,
    ) -> Result<CreateCheckoutSessionResult, DomainError> {
        let request = CreateCheckoutRequest {
            user_id,
            price_id: required("priceId", cmd.price_id)?,
            plan: required("plan", cmd.plan)?,
            interval: required("interval", cmd.interval)?,
            success_url: required("successUrl", cmd.success_url)?,
            cancel_url: required("cancelUrl", cmd.cancel_url)?,
        };

        let user_id = request.user_id.clone();
        let session = self
            .payment_provider
            .create_checkout_session(request)
            .await
            .map_err(|err| {
                tracing::error!(user_id = %user_id, error = %err, "Checkout session creation failed");
                DomainError::from(err)
            })?;

        tracing::info!(user_id = %user_id, session_id = %session.id, "Checkout session created");

        Ok(CreateCheckoutSessionResult {
            session_id: session.id,
            url: session.url,
        })
    }
}

fn required(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ValidationError::empty_field(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::domain::foundation::ErrorCode;
    use crate::ports::PaymentError;

    fn complete() -> CreateCheckoutSessionCommand {
        CreateCheckoutSessionCommand {
            price_id: Some("price_basic".into()),
            plan: Some("basic".into()),
            interval: Some("month".into()),
            success_url: Some("https://app.aionyx.test/dashboard".into()),
            cancel_url: Some("https://app.aionyx.test/pricing".into()),
        }
    }

    fn user() -> UserId {
        UserId::new("user_1").unwrap()
    }

    #[tokio::test]
    async fn returns_provider_url() {
        let provider = MockPaymentProvider::new();
        let handler = CreateCheckoutSessionHandler::new(Arc::new(provider.clone()));

        let result = handler.handle(user(), complete()).await.unwrap();

        assert_eq!(result.url, "https://checkout.stripe.test/c/pay/cs_test_mock");
        let requests = provider.checkout_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].user_id, user());
        assert_eq!(requests[0].price_id, "price_basic");
        assert_eq!(requests[0].interval, "month");
    }

    #[tokio::test]
    async fn each_missing_field_is_rejected() {
        let provider = MockPaymentProvider::new();
        let handler = CreateCheckoutSessionHandler::new(Arc::new(provider.clone()));

        let variants: Vec<fn(&mut CreateCheckoutSessionCommand)> = vec![
            |c| c.price_id = None,
            |c| c.plan = Some("  ".into()),
            |c| c.interval = None,
            |c| c.success_url = None,
            |c| c.cancel_url = Some(String::new()),
        ];
        for strip in variants {
            let mut cmd = complete();
            strip(&mut cmd);
            let err = handler.handle(user(), cmd).await.unwrap_err();
            assert_eq!(err.code, ErrorCode::EmptyField);
        }
        assert!(provider.checkout_requests().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_is_payment_provider_error() {
        let provider = MockPaymentProvider::new();
        provider.set_method_error(
            "create_checkout_session",
            PaymentError::invalid_request("No such price"),
        );
        let handler = CreateCheckoutSessionHandler::new(Arc::new(provider));

        let err = handler.handle(user(), complete()).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::PaymentProviderError);
    }
}
