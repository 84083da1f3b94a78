//! Shared fixtures for billing handler tests.

use std::sync::Arc;

use serde_json::{json, Value};

use super::{
    HandleIdentityWebhookCommand, HandleIdentityWebhookHandler, HandlePaymentWebhookCommand,
    HandlePaymentWebhookHandler,
};
use crate::adapters::clerk::MockIdentityProvider;
use crate::adapters::email::MockEmailSender;
use crate::adapters::storage::InMemoryBillingStore;
use crate::adapters::stripe::MockPaymentProvider;
use crate::domain::billing::{
    sign_stripe_payload, sign_svix_payload, StripeWebhookVerifier, Subscription,
    SubscriptionSnapshot, SubscriptionStatus, SubscriptionUpsert, SvixWebhookVerifier, User,
};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{SubscriptionRepository, UserRepository};

pub const STRIPE_SECRET: &str = "whsec_test_secret_12345";
// base64("test-signing-key-0123456789")
pub const SVIX_SECRET: &str = "whsec_dGVzdC1zaWduaW5nLWtleS0wMTIzNDU2Nzg5";

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// In-memory store plus mock collaborators, shared by every handler it builds.
pub struct Harness {
    pub store: InMemoryBillingStore,
    pub provider: MockPaymentProvider,
    pub identity: MockIdentityProvider,
    pub email: MockEmailSender,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            store: InMemoryBillingStore::new(),
            provider: MockPaymentProvider::new(),
            identity: MockIdentityProvider::new(),
            email: MockEmailSender::new(),
        }
    }

    pub fn payment_handler(&self) -> HandlePaymentWebhookHandler {
        let store = Arc::new(self.store.clone());
        HandlePaymentWebhookHandler::new(
            Arc::new(StripeWebhookVerifier::new(STRIPE_SECRET)),
            store.clone(),
            store.clone(),
            store,
            Arc::new(self.provider.clone()),
            Arc::new(self.identity.clone()),
            Arc::new(self.email.clone()),
        )
    }

    pub fn identity_handler(&self) -> HandleIdentityWebhookHandler {
        let verifier = SvixWebhookVerifier::new(SVIX_SECRET).expect("test secret is valid");
        self.identity_handler_with(Some(Arc::new(verifier)))
    }

    pub fn identity_handler_with(
        &self,
        verifier: Option<Arc<SvixWebhookVerifier>>,
    ) -> HandleIdentityWebhookHandler {
        HandleIdentityWebhookHandler::new(
            verifier,
            Arc::new(self.store.clone()),
            Arc::new(self.email.clone()),
        )
    }

    pub async fn seed_user(&self, id: &str, email: Option<&str>) {
        self.store
            .create(&User {
                id: UserId::new(id).unwrap(),
                email: email.map(String::from),
                first_name: Some("Ada".into()),
                last_name: None,
                image_url: None,
                created_at: Timestamp::now(),
            })
            .await
            .unwrap();
    }

    /// User with an active `basic` subscription on `price_basic`.
    pub async fn seed_subscribed_user(&self, id: &str, customer_id: &str, subscription_id: &str) {
        self.seed_user(id, Some("ada@example.com")).await;
        self.store
            .upsert(&SubscriptionUpsert {
                user_id: UserId::new(id).unwrap(),
                stripe_customer_id: Some(customer_id.into()),
                stripe_subscription_id: Some(subscription_id.into()),
                stripe_price_id: Some("price_basic".into()),
                plan: Some("basic".into()),
                status: SubscriptionStatus::Active,
                current_period_end: Timestamp::from_unix_secs(1_700_000_000).unwrap(),
            })
            .await
            .unwrap();
    }

    pub fn add_processor_subscription(
        &self,
        id: &str,
        customer_id: &str,
        status: &str,
        current_period_end: i64,
    ) {
        self.provider.add_subscription(SubscriptionSnapshot {
            id: id.into(),
            customer_id: Some(customer_id.into()),
            status: status.parse().unwrap(),
            price_id: Some("price_basic".into()),
            current_period_end: Timestamp::from_unix_secs(current_period_end).unwrap(),
        });
    }

    pub async fn subscription(&self, user_id: &str) -> Option<Subscription> {
        self.store
            .find_by_user_id(&UserId::new(user_id).unwrap())
            .await
            .unwrap()
    }
}

pub fn stripe_command(body: &Value) -> HandlePaymentWebhookCommand {
    let payload = body.to_string();
    HandlePaymentWebhookCommand {
        signature: Some(sign_stripe_payload(STRIPE_SECRET, now(), &payload)),
        payload: payload.into_bytes(),
    }
}

pub fn identity_command(body: &Value) -> HandleIdentityWebhookCommand {
    let payload = body.to_string();
    let timestamp = now();
    HandleIdentityWebhookCommand {
        svix_id: Some("msg_1".into()),
        svix_timestamp: Some(timestamp.to_string()),
        svix_signature: Some(sign_svix_payload(SVIX_SECRET, "msg_1", timestamp, &payload)),
        payload: payload.into_bytes(),
    }
}

pub fn checkout_event(user_id: &str, customer_id: &str, subscription_id: &str) -> Value {
    json!({
        "id": "evt_checkout",
        "type": "checkout.session.completed",
        "data": { "object": {
            "id": "cs_1",
            "object": "checkout.session",
            "mode": "subscription",
            "customer": customer_id,
            "subscription": subscription_id,
            "metadata": { "userId": user_id, "plan": "basic", "interval": "month" }
        }}
    })
}

pub fn invoice_event(invoice_id: &str, customer_id: &str, subscription_id: &str, amount: i64) -> Value {
    json!({
        "id": format!("evt_{}", invoice_id),
        "type": "invoice.payment_succeeded",
        "data": { "object": {
            "id": invoice_id,
            "object": "invoice",
            "customer": customer_id,
            "subscription": subscription_id,
            "amount_paid": amount,
            "currency": "usd",
            "status": "paid",
            "created": 1_700_000_000
        }}
    })
}

pub fn subscription_event(
    event_type: &str,
    subscription_id: &str,
    customer_id: &str,
    status: &str,
    current_period_end: i64,
) -> Value {
    json!({
        "id": "evt_subscription",
        "type": event_type,
        "data": { "object": {
            "id": subscription_id,
            "object": "subscription",
            "customer": customer_id,
            "status": status,
            "current_period_end": current_period_end,
            "items": { "data": [ { "price": { "id": "price_basic" } } ] }
        }}
    })
}

pub fn user_created_event(user_id: &str, email: Option<&str>) -> Value {
    let addresses: Vec<Value> = email
        .map(|e| vec![json!({ "id": "idn_1", "email_address": e })])
        .unwrap_or_default();
    json!({
        "type": "user.created",
        "object": "event",
        "data": {
            "id": user_id,
            "email_addresses": addresses,
            "primary_email_address_id": email.map(|_| "idn_1"),
            "first_name": "Ada",
            "last_name": "Lovelace",
            "image_url": "https://img.clerk.test/ada.png",
            "created_at": 1_700_000_000_000i64
        }
    })
}

pub fn user_deleted_event(user_id: &str) -> Value {
    json!({
        "type": "user.deleted",
        "object": "event",
        "data": { "id": user_id, "deleted": true, "object": "user" }
    })
}
