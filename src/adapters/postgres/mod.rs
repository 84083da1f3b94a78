//! PostgreSQL adapters - Database implementations for the record store ports.
//!
//! - `PostgresUserRepository` - Users, with transactional cascade delete
//! - `PostgresSubscriptionRepository` - One row per user, upsert + reverse lookup
//! - `PostgresPaymentRepository` - Append-only ledger keyed on invoice id

mod errors;
mod payment_repository;
mod subscription_repository;
mod user_repository;

pub use payment_repository::PostgresPaymentRepository;
pub use subscription_repository::PostgresSubscriptionRepository;
pub use user_repository::PostgresUserRepository;

/// Embedded migrations for the billing schema.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
