//! HandleIdentityWebhookHandler - Command handler for Clerk webhooks.
//!
//! Mirrors identity lifecycle into the record store: `user.created` inserts
//! the user and sends a best-effort welcome email, `user.deleted` removes the
//! user together with its subscription and payments.

use std::sync::Arc;

use crate::domain::billing::{
    DeletedUserData, IdentityEvent, IdentityUserData, SvixHeaders, SvixWebhookVerifier,
    WebhookError,
};
use crate::domain::foundation::UserId;
use crate::ports::{EmailSender, UserRepository, WelcomeEmail};

/// Command to handle a Clerk (Svix-signed) webhook delivery.
#[derive(Debug, Clone)]
pub struct HandleIdentityWebhookCommand {
    pub payload: Vec<u8>,
    pub svix_id: Option<String>,
    pub svix_timestamp: Option<String>,
    pub svix_signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityWebhookOutcome {
    /// `inserted` is false for a repeated delivery.
    UserCreated { user_id: UserId, inserted: bool },
    /// `existed` is false when the user was already gone.
    UserDeleted { user_id: UserId, existed: bool },
    Ignored(String),
}

pub struct HandleIdentityWebhookHandler {
    /// `None` when no signing secret is configured.
    verifier: Option<Arc<SvixWebhookVerifier>>,
    users: Arc<dyn UserRepository>,
    email_sender: Arc<dyn EmailSender>,
}

impl HandleIdentityWebhookHandler {
    pub fn new(
        verifier: Option<Arc<SvixWebhookVerifier>>,
        users: Arc<dyn UserRepository>,
        email_sender: Arc<dyn EmailSender>,
    ) -> Self {
        Self {
            verifier,
            users,
            email_sender,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandleIdentityWebhookCommand,
    ) -> Result<IdentityWebhookOutcome, WebhookError> {
        let verifier = self.verifier.as_ref().ok_or_else(|| {
            tracing::error!("Clerk webhook received but no signing secret is configured");
            WebhookError::Misconfigured("clerk webhook secret")
        })?;

        let headers = SvixHeaders::new(
            cmd.svix_id.as_deref(),
            cmd.svix_timestamp.as_deref(),
            cmd.svix_signature.as_deref(),
        )?;
        let envelope = verifier.verify_and_parse(&cmd.payload, &headers)?;

        match IdentityEvent::classify(&envelope)? {
            IdentityEvent::UserCreated(data) => self.handle_user_created(data).await,
            IdentityEvent::UserDeleted(data) => self.handle_user_deleted(data).await,
            IdentityEvent::UserUpdated => {
                tracing::debug!(svix_id = %headers.id, "Ignoring user.updated");
                Ok(IdentityWebhookOutcome::Ignored(envelope.event_type))
            }
            IdentityEvent::Unrecognized(event_type) => {
                tracing::info!(
                    svix_id = %headers.id,
                    event_type = %event_type,
                    "Ignoring unhandled Clerk event"
                );
                Ok(IdentityWebhookOutcome::Ignored(event_type))
            }
        }
    }

    async fn handle_user_created(
        &self,
        data: IdentityUserData,
    ) -> Result<IdentityWebhookOutcome, WebhookError> {
        let user = data.to_user()?;
        let saved = self.users.create(&user).await.map_err(|err| {
            tracing::error!(user_id = %user.id, error = %err, "Failed to create user");
            WebhookError::from(err)
        })?;

        if !saved.was_inserted() {
            tracing::debug!(user_id = %user.id, "User already exists; welcome email skipped");
            return Ok(IdentityWebhookOutcome::UserCreated {
                user_id: user.id,
                inserted: false,
            });
        }

        tracing::info!(user_id = %user.id, "User created");

        match user.email.as_deref() {
            Some(address) => {
                let email = WelcomeEmail {
                    email: address.to_string(),
                    first_name: user.greeting_name().to_string(),
                };
                if let Err(err) = self.email_sender.send_welcome_email(&email).await {
                    tracing::warn!(user_id = %user.id, error = %err, "Welcome email failed");
                }
            }
            None => tracing::debug!(user_id = %user.id, "User has no email; welcome skipped"),
        }

        Ok(IdentityWebhookOutcome::UserCreated {
            user_id: user.id,
            inserted: true,
        })
    }

    async fn handle_user_deleted(
        &self,
        data: DeletedUserData,
    ) -> Result<IdentityWebhookOutcome, WebhookError> {
        let user_id = data.user_id()?;
        let existed = self.users.delete(&user_id).await.map_err(|err| {
            tracing::error!(user_id = %user_id, error = %err, "Failed to delete user");
            WebhookError::from(err)
        })?;

        tracing::info!(user_id = %user_id, existed, "User deleted");
        Ok(IdentityWebhookOutcome::UserDeleted { user_id, existed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::billing::testing::*;
    use crate::domain::billing::Payment;
    use crate::domain::foundation::Timestamp;
    use crate::ports::{PaymentRepository, SubscriptionRepository};
    use serde_json::json;

    #[tokio::test]
    async fn missing_secret_is_misconfigured() {
        let harness = Harness::new();
        let handler = harness.identity_handler_with(None);

        let err = handler
            .handle(identity_command(&user_created_event("user_1", None)))
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::Misconfigured(_)));
        assert_eq!(err.status_code().as_u16(), 500);
    }

    #[tokio::test]
    async fn missing_headers_are_bad_request() {
        let harness = Harness::new();
        let mut cmd = identity_command(&user_created_event("user_1", None));
        cmd.svix_timestamp = None;

        let err = harness.identity_handler().handle(cmd).await.unwrap_err();

        assert!(matches!(err, WebhookError::MissingHeaders("svix-timestamp")));
    }

    #[tokio::test]
    async fn tampered_body_writes_nothing() {
        let harness = Harness::new();
        let mut cmd = identity_command(&user_created_event("user_1", None));
        cmd.payload = user_created_event("user_2", None).to_string().into_bytes();

        let err = harness.identity_handler().handle(cmd).await.unwrap_err();

        assert!(matches!(err, WebhookError::InvalidSignature));
        assert_eq!(harness.store.write_count(), 0);
    }

    #[tokio::test]
    async fn user_created_inserts_and_welcomes() {
        let harness = Harness::new();

        let outcome = harness
            .identity_handler()
            .handle(identity_command(&user_created_event(
                "user_1",
                Some("ada@example.com"),
            )))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            IdentityWebhookOutcome::UserCreated {
                user_id: UserId::new("user_1").unwrap(),
                inserted: true,
            }
        );
        let user = harness
            .store
            .find_by_id(&UserId::new("user_1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.email.as_deref(), Some("ada@example.com"));
        assert_eq!(user.created_at.as_unix_secs(), 1_700_000_000);

        let welcomes = harness.email.welcome_emails();
        assert_eq!(welcomes.len(), 1);
        assert_eq!(welcomes[0].first_name, "Ada");
    }

    #[tokio::test]
    async fn duplicate_user_created_welcomes_once() {
        let harness = Harness::new();
        let handler = harness.identity_handler();
        let body = user_created_event("user_1", Some("ada@example.com"));

        handler.handle(identity_command(&body)).await.unwrap();
        let second = handler.handle(identity_command(&body)).await.unwrap();

        assert!(matches!(
            second,
            IdentityWebhookOutcome::UserCreated { inserted: false, .. }
        ));
        assert_eq!(harness.email.welcome_emails().len(), 1);
    }

    #[tokio::test]
    async fn welcome_failure_does_not_fail_creation() {
        let harness = Harness::new();
        harness.email.set_failing(true);

        let result = harness
            .identity_handler()
            .handle(identity_command(&user_created_event(
                "user_1",
                Some("ada@example.com"),
            )))
            .await;

        assert!(result.is_ok());
        assert!(harness
            .store
            .find_by_id(&UserId::new("user_1").unwrap())
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn phone_only_user_is_created_without_email() {
        let harness = Harness::new();

        harness
            .identity_handler()
            .handle(identity_command(&user_created_event("user_1", None)))
            .await
            .unwrap();

        assert!(harness.email.welcome_emails().is_empty());
    }

    #[tokio::test]
    async fn user_deleted_cascades() {
        let harness = Harness::new();
        harness.seed_subscribed_user("user_1", "cus_1", "sub_1").await;
        let user_id = UserId::new("user_1").unwrap();
        harness
            .store
            .append(&Payment::record(
                user_id.clone(),
                "in_1",
                2900,
                "usd",
                "succeeded",
                Timestamp::now(),
            ))
            .await
            .unwrap();

        let outcome = harness
            .identity_handler()
            .handle(identity_command(&user_deleted_event("user_1")))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            IdentityWebhookOutcome::UserDeleted {
                user_id: user_id.clone(),
                existed: true,
            }
        );
        assert!(harness.store.find_by_id(&user_id).await.unwrap().is_none());
        assert!(harness.store.find_by_user_id(&user_id).await.unwrap().is_none());
        assert!(harness.store.list_by_user(&user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_unknown_user_succeeds() {
        let harness = Harness::new();

        let outcome = harness
            .identity_handler()
            .handle(identity_command(&user_deleted_event("user_ghost")))
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            IdentityWebhookOutcome::UserDeleted { existed: false, .. }
        ));
    }

    #[tokio::test]
    async fn user_deleted_without_id_is_bad_request() {
        let harness = Harness::new();
        let body = json!({ "type": "user.deleted", "data": { "deleted": true } });

        let err = harness
            .identity_handler()
            .handle(identity_command(&body))
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::MissingField("data.id")));
    }

    #[tokio::test]
    async fn updated_and_unknown_events_are_ignored() {
        let harness = Harness::new();
        let handler = harness.identity_handler();

        let updated = handler
            .handle(identity_command(&json!({ "type": "user.updated", "data": {} })))
            .await
            .unwrap();
        let session = handler
            .handle(identity_command(&json!({ "type": "session.created", "data": {} })))
            .await
            .unwrap();

        assert_eq!(updated, IdentityWebhookOutcome::Ignored("user.updated".into()));
        assert_eq!(session, IdentityWebhookOutcome::Ignored("session.created".into()));
        assert_eq!(harness.store.write_count(), 0);
    }
}
