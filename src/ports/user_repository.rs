//! User repository port.

use async_trait::async_trait;

use super::record_store::SaveResult;
use crate::domain::billing::User;
use crate::domain::foundation::{DomainError, UserId};

/// Persistence for identity records.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user unless one with the same id exists.
    async fn create(&self, user: &User) -> Result<SaveResult, DomainError>;

    /// Find a user by id.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Delete a user together with their payments and subscription.
    ///
    /// Dependents are removed before the user row. Returns `false` when no
    /// user existed, which is not an error.
    async fn delete(&self, id: &UserId) -> Result<bool, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn UserRepository) {}
    }
}
