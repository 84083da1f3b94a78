//! In-memory email sender for tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::ports::{EmailError, EmailSender, PaymentConfirmationEmail, WelcomeEmail};

/// Records every email instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct MockEmailSender {
    welcome: Arc<Mutex<Vec<WelcomeEmail>>>,
    confirmations: Arc<Mutex<Vec<PaymentConfirmationEmail>>>,
    fail: Arc<AtomicBool>,
}

impl MockEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent send fail with `EmailError::Unavailable`.
    /// Failed sends are still recorded.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn welcome_emails(&self) -> Vec<WelcomeEmail> {
        self.welcome.lock().unwrap().clone()
    }

    pub fn payment_confirmations(&self) -> Vec<PaymentConfirmationEmail> {
        self.confirmations.lock().unwrap().clone()
    }

    fn outcome(&self) -> Result<(), EmailError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(EmailError::Unavailable("mock failure".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl EmailSender for MockEmailSender {
    async fn send_welcome_email(&self, email: &WelcomeEmail) -> Result<(), EmailError> {
        self.welcome.lock().unwrap().push(email.clone());
        self.outcome()
    }

    async fn send_payment_confirmation_email(
        &self,
        email: &PaymentConfirmationEmail,
    ) -> Result<(), EmailError> {
        self.confirmations.lock().unwrap().push(email.clone());
        self.outcome()
    }
}
