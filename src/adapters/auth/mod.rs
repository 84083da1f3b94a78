//! Authentication adapters.
//!
//! Implementations of the `SessionValidator` port:
//!
//! - `clerk_session` - Offline RS256 session token validation
//! - `mock` - Test implementation that doesn't require keys

mod clerk_session;
mod mock;

pub use clerk_session::{ClerkSessionValidator, SessionClaims};
pub use mock::MockSessionValidator;
