//! In-Memory Billing Store Adapter
//!
//! Implements the user, subscription and payment repositories over a single
//! lock-protected set of tables, so every operation (including the cascading
//! delete) is atomic. Mirrors the Postgres adapter's semantics, including the
//! rule that subscriptions and payments need an existing user.
//! Useful for testing and local development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::billing::{Payment, Subscription, SubscriptionUpsert, User};
use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::{
    PaymentRepository, SaveResult, SubscriptionRepository, UpsertResult, UserRepository,
};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    subscriptions: HashMap<UserId, Subscription>,
    payments: Vec<Payment>,
}

/// In-memory record store shared by all three repository ports.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBillingStore {
    tables: Arc<RwLock<Tables>>,
    writes: Arc<AtomicU32>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryBillingStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of write operations attempted (useful for tests)
    pub fn write_count(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent write fail with a database error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Get the number of stored subscription rows
    pub async fn subscription_count(&self) -> usize {
        self.tables.read().await.subscriptions.len()
    }

    /// Get the number of stored payments
    pub async fn payment_count(&self) -> usize {
        self.tables.read().await.payments.len()
    }

    fn begin_write(&self) -> Result<(), DomainError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::database("simulated write failure"));
        }
        Ok(())
    }
}

fn missing_user(user_id: &UserId) -> DomainError {
    DomainError::new(
        ErrorCode::ReferencedUserMissing,
        format!("User {} does not exist", user_id),
    )
    .with_detail("user_id", user_id.as_str())
}

#[async_trait]
impl UserRepository for InMemoryBillingStore {
    async fn create(&self, user: &User) -> Result<SaveResult, DomainError> {
        self.begin_write()?;
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&user.id) {
            return Ok(SaveResult::AlreadyExists);
        }
        tables.users.insert(user.id.clone(), user.clone());
        Ok(SaveResult::Inserted)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        Ok(self.tables.read().await.users.get(id).cloned())
    }

    async fn delete(&self, id: &UserId) -> Result<bool, DomainError> {
        self.begin_write()?;
        let mut tables = self.tables.write().await;
        tables.payments.retain(|p| &p.user_id != id);
        tables.subscriptions.remove(id);
        Ok(tables.users.remove(id).is_some())
    }
}

#[async_trait]
impl SubscriptionRepository for InMemoryBillingStore {
    async fn upsert(&self, change: &SubscriptionUpsert) -> Result<UpsertResult, DomainError> {
        self.begin_write()?;
        let mut tables = self.tables.write().await;

        let existing = tables.subscriptions.get(&change.user_id);
        let existed = existing.is_some();
        let Some(row) = change.apply(existing) else {
            return Ok(UpsertResult::Skipped);
        };

        if !existed && !tables.users.contains_key(&change.user_id) {
            return Err(missing_user(&change.user_id));
        }

        tables.subscriptions.insert(change.user_id.clone(), row);
        Ok(if existed {
            UpsertResult::Updated
        } else {
            UpsertResult::Created
        })
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError> {
        Ok(self.tables.read().await.subscriptions.get(user_id).cloned())
    }

    async fn find_user_id_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<UserId>, DomainError> {
        Ok(self
            .tables
            .read()
            .await
            .subscriptions
            .values()
            .find(|s| s.stripe_customer_id == customer_id)
            .map(|s| s.user_id.clone()))
    }
}

#[async_trait]
impl PaymentRepository for InMemoryBillingStore {
    async fn append(&self, payment: &Payment) -> Result<SaveResult, DomainError> {
        self.begin_write()?;
        let mut tables = self.tables.write().await;
        if tables
            .payments
            .iter()
            .any(|p| p.stripe_invoice_id == payment.stripe_invoice_id)
        {
            return Ok(SaveResult::AlreadyExists);
        }
        if !tables.users.contains_key(&payment.user_id) {
            return Err(missing_user(&payment.user_id));
        }
        tables.payments.push(payment.clone());
        Ok(SaveResult::Inserted)
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Payment>, DomainError> {
        let mut payments: Vec<Payment> = self
            .tables
            .read()
            .await
            .payments
            .iter()
            .filter(|p| &p.user_id == user_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(payments)
    }
}
