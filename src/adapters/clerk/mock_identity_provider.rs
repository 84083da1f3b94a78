//! In-memory identity provider for tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::foundation::UserId;
use crate::ports::{BillingMetadata, IdentityError, IdentityProvider};

#[derive(Debug, Clone, Default)]
pub struct MockIdentityProvider {
    updates: Arc<Mutex<Vec<(UserId, BillingMetadata)>>>,
    error: Arc<Mutex<Option<IdentityError>>>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_error(&self, error: IdentityError) {
        *self.error.lock().unwrap() = Some(error);
    }

    pub fn updates(&self) -> Vec<(UserId, BillingMetadata)> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn update_billing_metadata(
        &self,
        user_id: &UserId,
        metadata: &BillingMetadata,
    ) -> Result<(), IdentityError> {
        if let Some(err) = self.error.lock().unwrap().clone() {
            return Err(err);
        }
        self.updates
            .lock()
            .unwrap()
            .push((user_id.clone(), metadata.clone()));
        Ok(())
    }
}
