//! Storage adapters.

mod in_memory_billing_store;

pub use in_memory_billing_store::InMemoryBillingStore;
