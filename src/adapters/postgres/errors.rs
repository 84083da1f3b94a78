//! sqlx error mapping shared by the billing repositories.

use crate::domain::foundation::{DomainError, ErrorCode};

const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Maps a sqlx error to a `DomainError`, turning foreign-key violations into
/// `ReferencedUserMissing`.
pub(crate) fn map_sqlx_error(context: &str, err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) {
            return DomainError::new(
                ErrorCode::ReferencedUserMissing,
                format!("{}: referenced user does not exist", context),
            );
        }
    }
    DomainError::database(format!("{}: {}", context, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_database_errors() {
        let err = map_sqlx_error("Failed to load user", sqlx::Error::RowNotFound);
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(err.message.starts_with("Failed to load user: "));
    }
}
