//! Append-only payment ledger entries.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PaymentId, Timestamp, UserId};

/// A settled charge, recorded once per processor invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub user_id: UserId,
    /// Processor invoice id; the idempotency key for the ledger.
    pub stripe_invoice_id: String,
    /// Amount in minor currency units (cents).
    pub amount: i64,
    /// ISO currency code, lowercase as the processor reports it.
    pub currency: String,
    pub status: String,
    pub created_at: Timestamp,
}

impl Payment {
    /// Creates a new ledger entry with a fresh id.
    pub fn record(
        user_id: UserId,
        stripe_invoice_id: impl Into<String>,
        amount: i64,
        currency: impl Into<String>,
        status: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            user_id,
            stripe_invoice_id: stripe_invoice_id.into(),
            amount,
            currency: currency.into().to_lowercase(),
            status: status.into(),
            created_at,
        }
    }
}
