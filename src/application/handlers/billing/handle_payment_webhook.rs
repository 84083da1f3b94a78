//! HandlePaymentWebhookHandler - Command handler for Stripe webhooks.
//!
//! Verifies the signature over the raw body, classifies the event and
//! reconciles the stored subscription (and payment ledger) with it.
//!
//! Outcomes map onto the sender's retry policy:
//! - `Ok(_)` (including unreconcilable and ignored events): 200, no retry
//! - input errors: 400, no retry
//! - persistence or processor failures: 500, Stripe re-delivers

use std::sync::Arc;

use crate::domain::billing::reconciler::{self, Unreconcilable};
use crate::domain::billing::{
    CheckoutSessionObject, InvoiceObject, Payment, PaymentEvent, PaymentEventKind, StripeEvent,
    StripeWebhookVerifier, SubscriptionObject, SubscriptionSnapshot, SubscriptionStatus,
    WebhookError,
};
use crate::domain::foundation::{ErrorCode, UserId};
use crate::ports::{
    BillingMetadata, EmailSender, IdentityProvider, PaymentConfirmationEmail, PaymentProvider,
    PaymentRepository, SubscriptionRepository, UpsertResult, UserRepository,
};

use super::user_lookup::UserLookupBridge;

/// Header carrying the Stripe signature.
pub const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Status recorded on ledger entries created from paid invoices.
const PAYMENT_SUCCEEDED: &str = "succeeded";

/// Command to handle a Stripe webhook delivery.
#[derive(Debug, Clone)]
pub struct HandlePaymentWebhookCommand {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header value, if sent.
    pub signature: Option<String>,
}

/// Result of webhook processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentWebhookOutcome {
    /// The subscription row was written (or the upsert was a no-op).
    Applied {
        kind: PaymentEventKind,
        user_id: UserId,
        result: UpsertResult,
    },
    /// Preconditions not met; acknowledged without touching the store.
    Unreconcilable {
        kind: PaymentEventKind,
        reason: Unreconcilable,
    },
    /// Event type this service does not handle.
    Ignored(String),
}

/// Handler for processing Stripe webhooks.
pub struct HandlePaymentWebhookHandler {
    verifier: Arc<StripeWebhookVerifier>,
    users: Arc<dyn UserRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    payments: Arc<dyn PaymentRepository>,
    payment_provider: Arc<dyn PaymentProvider>,
    identity_provider: Arc<dyn IdentityProvider>,
    email_sender: Arc<dyn EmailSender>,
    lookup: UserLookupBridge,
}

impl HandlePaymentWebhookHandler {
    pub fn new(
        verifier: Arc<StripeWebhookVerifier>,
        users: Arc<dyn UserRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        payments: Arc<dyn PaymentRepository>,
        payment_provider: Arc<dyn PaymentProvider>,
        identity_provider: Arc<dyn IdentityProvider>,
        email_sender: Arc<dyn EmailSender>,
    ) -> Self {
        let lookup = UserLookupBridge::new(subscriptions.clone());
        Self {
            verifier,
            users,
            subscriptions,
            payments,
            payment_provider,
            identity_provider,
            email_sender,
            lookup,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandlePaymentWebhookCommand,
    ) -> Result<PaymentWebhookOutcome, WebhookError> {
        // 1. Verify signature over the exact body bytes, then parse
        let signature = cmd
            .signature
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(WebhookError::MissingHeaders(STRIPE_SIGNATURE_HEADER))?;
        let event = self.verifier.verify_and_parse(&cmd.payload, signature)?;

        // 2. Classify and dispatch
        let outcome = match PaymentEvent::classify(&event)? {
            PaymentEvent::CheckoutSessionCompleted(session) => {
                self.handle_checkout_completed(&event, session).await
            }
            PaymentEvent::InvoicePaymentSucceeded(invoice) => {
                self.handle_invoice_succeeded(&event, invoice).await
            }
            PaymentEvent::SubscriptionUpdated(subscription) => {
                self.handle_subscription_changed(
                    &event,
                    PaymentEventKind::SubscriptionUpdated,
                    subscription,
                )
                .await
            }
            PaymentEvent::SubscriptionDeleted(subscription) => {
                self.handle_subscription_changed(
                    &event,
                    PaymentEventKind::SubscriptionDeleted,
                    subscription,
                )
                .await
            }
            PaymentEvent::Unrecognized(event_type) => {
                tracing::info!(
                    event_id = %event.id,
                    event_type = %event_type,
                    "Ignoring unhandled Stripe event"
                );
                Ok(PaymentWebhookOutcome::Ignored(event_type))
            }
        };

        if let Err(err) = &outcome {
            if err.is_retryable() {
                tracing::error!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    error = %err,
                    "Stripe webhook failed; sender will retry"
                );
            }
        }
        outcome
    }

    async fn handle_checkout_completed(
        &self,
        event: &StripeEvent,
        session: CheckoutSessionObject,
    ) -> Result<PaymentWebhookOutcome, WebhookError> {
        let kind = PaymentEventKind::CheckoutSessionCompleted;
        let refs = match reconciler::checkout_refs(&session) {
            Ok(refs) => refs,
            Err(reason) => return Ok(unreconcilable(event, kind, reason)),
        };

        let snapshot = self.fetch_subscription(&refs.subscription_id).await?;
        let user_id = refs.user_id.clone();
        let plan = refs.plan.clone();

        let change = reconciler::checkout_upsert(refs, &snapshot);
        let result = match self.subscriptions.upsert(&change).await {
            Ok(result) => result,
            Err(err) if err.code == ErrorCode::ReferencedUserMissing => {
                return Ok(unreconcilable(event, kind, Unreconcilable::UnknownUser(user_id)));
            }
            Err(err) => return Err(err.into()),
        };
        if result == UpsertResult::Skipped {
            tracing::warn!(
                event_id = %event.id,
                user_id = %user_id,
                subscription_id = %snapshot.id,
                "Checkout subscription has no price; row not created"
            );
        } else {
            tracing::info!(
                event_id = %event.id,
                user_id = %user_id,
                customer_id = %change.stripe_customer_id.as_deref().unwrap_or_default(),
                subscription_id = %snapshot.id,
                status = %snapshot.status,
                "Subscription reconciled from checkout"
            );
        }

        self.sync_identity_metadata(&user_id, plan, snapshot.status)
            .await;

        Ok(PaymentWebhookOutcome::Applied {
            kind,
            user_id,
            result,
        })
    }

    async fn handle_invoice_succeeded(
        &self,
        event: &StripeEvent,
        invoice: InvoiceObject,
    ) -> Result<PaymentWebhookOutcome, WebhookError> {
        let kind = PaymentEventKind::InvoicePaymentSucceeded;
        let (subscription_id, customer_id) = match reconciler::invoice_refs(&invoice) {
            Ok(refs) => refs,
            Err(reason) => return Ok(unreconcilable(event, kind, reason)),
        };

        let Some(user_id) = self.lookup.resolve(customer_id).await? else {
            return Ok(unreconcilable(
                event,
                kind,
                Unreconcilable::UnknownCustomer(customer_id.to_string()),
            ));
        };

        let snapshot = self.fetch_subscription(subscription_id).await?;
        let result = self
            .subscriptions
            .upsert(&reconciler::period_update(user_id.clone(), &snapshot))
            .await?;
        if result == UpsertResult::Skipped {
            return Ok(unreconcilable(
                event,
                kind,
                Unreconcilable::NoSubscriptionRow(user_id),
            ));
        }

        if invoice.id.is_empty() {
            tracing::warn!(event_id = %event.id, "Invoice without id; payment not recorded");
        } else {
            let payment = Payment::record(
                user_id.clone(),
                invoice.id.clone(),
                invoice.amount_paid,
                invoice.currency.clone(),
                PAYMENT_SUCCEEDED,
                invoice.created_at(),
            );
            if self.payments.append(&payment).await?.was_inserted() {
                self.send_payment_confirmation(&payment).await;
            }
        }

        tracing::info!(
            event_id = %event.id,
            user_id = %user_id,
            customer_id = %customer_id,
            subscription_id = %subscription_id,
            status = %snapshot.status,
            "Subscription renewed from invoice"
        );

        Ok(PaymentWebhookOutcome::Applied {
            kind,
            user_id,
            result,
        })
    }

    async fn handle_subscription_changed(
        &self,
        event: &StripeEvent,
        kind: PaymentEventKind,
        subscription: SubscriptionObject,
    ) -> Result<PaymentWebhookOutcome, WebhookError> {
        let customer_id = match reconciler::subscription_customer(&subscription) {
            Ok(customer_id) => customer_id,
            Err(reason) => return Ok(unreconcilable(event, kind, reason)),
        };

        let Some(user_id) = self.lookup.resolve(customer_id).await? else {
            return Ok(unreconcilable(
                event,
                kind,
                Unreconcilable::UnknownCustomer(customer_id.to_string()),
            ));
        };

        let snapshot = subscription.snapshot()?;
        let change = match kind {
            PaymentEventKind::SubscriptionDeleted => {
                reconciler::cancellation(user_id.clone(), &snapshot)
            }
            _ => reconciler::period_update(user_id.clone(), &snapshot),
        };

        let result = self.subscriptions.upsert(&change).await?;
        if result == UpsertResult::Skipped {
            return Ok(unreconcilable(
                event,
                kind,
                Unreconcilable::NoSubscriptionRow(user_id),
            ));
        }

        tracing::info!(
            event_id = %event.id,
            event_type = kind.as_str(),
            user_id = %user_id,
            customer_id = %customer_id,
            subscription_id = %snapshot.id,
            status = %change.status,
            "Subscription status reconciled"
        );

        Ok(PaymentWebhookOutcome::Applied {
            kind,
            user_id,
            result,
        })
    }

    /// Fetches the authoritative subscription from Stripe.
    ///
    /// A subscription Stripe does not know is treated as a processor failure
    /// so the delivery is retried.
    async fn fetch_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<SubscriptionSnapshot, WebhookError> {
        self.payment_provider
            .get_subscription(subscription_id)
            .await?
            .ok_or_else(|| {
                WebhookError::Provider(format!("subscription {} not found", subscription_id))
            })
    }

    async fn sync_identity_metadata(
        &self,
        user_id: &UserId,
        plan: Option<String>,
        subscription_status: SubscriptionStatus,
    ) {
        let metadata = BillingMetadata {
            plan,
            subscription_status,
        };
        if let Err(err) = self
            .identity_provider
            .update_billing_metadata(user_id, &metadata)
            .await
        {
            tracing::warn!(user_id = %user_id, error = %err, "Identity metadata sync failed");
        }
    }

    async fn send_payment_confirmation(&self, payment: &Payment) {
        let user = match self.users.find_by_id(&payment.user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(user_id = %payment.user_id, error = %err, "Could not load user for receipt");
                return;
            }
        };
        let Some(address) = user.email.clone() else {
            tracing::debug!(user_id = %user.id, "User has no email; receipt skipped");
            return;
        };

        let plan = match self.subscriptions.find_by_user_id(&user.id).await {
            Ok(Some(subscription)) => subscription.plan.unwrap_or(subscription.stripe_price_id),
            _ => String::from("subscription"),
        };

        let email = PaymentConfirmationEmail {
            email: address,
            first_name: user.greeting_name().to_string(),
            amount: payment.amount,
            currency: payment.currency.clone(),
            plan,
            date: payment.created_at,
        };
        if let Err(err) = self.email_sender.send_payment_confirmation_email(&email).await {
            tracing::warn!(
                user_id = %user.id,
                invoice_id = %payment.stripe_invoice_id,
                error = %err,
                "Payment confirmation email failed"
            );
        }
    }
}

fn unreconcilable(
    event: &StripeEvent,
    kind: PaymentEventKind,
    reason: Unreconcilable,
) -> PaymentWebhookOutcome {
    tracing::warn!(
        event_id = %event.id,
        event_type = kind.as_str(),
        reason = %reason,
        "Stripe event could not be reconciled; acknowledging"
    );
    PaymentWebhookOutcome::Unreconcilable { kind, reason }
}
