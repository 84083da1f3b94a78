//! Email collaborator port.
//!
//! Notification sends are best-effort: callers log failures and carry on.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::Timestamp;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeEmail {
    pub email: String,
    pub first_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmationEmail {
    pub email: String,
    pub first_name: String,
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
    pub plan: String,
    pub date: Timestamp,
}

#[derive(Debug, Clone, Error)]
pub enum EmailError {
    #[error("Email provider unavailable: {0}")]
    Unavailable(String),

    #[error("Email rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_welcome_email(&self, email: &WelcomeEmail) -> Result<(), EmailError>;

    async fn send_payment_confirmation_email(
        &self,
        email: &PaymentConfirmationEmail,
    ) -> Result<(), EmailError>;
}
