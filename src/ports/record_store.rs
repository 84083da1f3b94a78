//! Shared result types for the record store ports.
//!
//! The store is split into `UserRepository`, `SubscriptionRepository` and
//! `PaymentRepository`. Every write is idempotent: repeating it with the same
//! input leaves the same end state and reports what actually happened.

/// Outcome of an insert-only write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// The record was written by this call.
    Inserted,
    /// An identical key was already present; nothing changed.
    AlreadyExists,
}

impl SaveResult {
    pub fn was_inserted(&self) -> bool {
        matches!(self, SaveResult::Inserted)
    }
}

/// Outcome of a subscription upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertResult {
    Created,
    Updated,
    /// No row exists and the change lacks the fields needed to create one.
    Skipped,
}
