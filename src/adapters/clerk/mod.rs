//! Clerk identity provider adapters.
//!
//! Session token validation lives in `adapters::auth`; this module covers
//! the Backend API calls made while reconciling billing events.

mod clerk_identity_adapter;
mod mock_identity_provider;

pub use clerk_identity_adapter::{ClerkConfig, ClerkIdentityAdapter};
pub use mock_identity_provider::MockIdentityProvider;
