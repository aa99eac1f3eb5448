//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`NotFound`] thrown when a referenced user, wish, offer or wishlist is
//!   missing.
//! - [`InvalidOperation`] thrown when a business rule rejects the request
//!   (funding your own wish, funding a fully funded wish, overfunding, changing
//!   the price of a wish that already has offers).
//! - [`Forbidden`] thrown when the caller does not own the record it is trying
//!   to change.
//! - [`ExistingKey`] thrown when a username or email is already taken.
//! - [`InvalidAmount`] thrown for non-positive pledges, negative prices and
//!   blank names.
//! - [`InvalidId`] thrown when a stored id is not a UUID.
//! - [`Database`] thrown when the store or the transaction fails.
//!
//!  [`NotFound`]: EngineError::NotFound
//!  [`InvalidOperation`]: EngineError::InvalidOperation
//!  [`Forbidden`]: EngineError::Forbidden
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidId`]: EngineError::InvalidId
//!  [`Database`]: EngineError::Database
use sea_orm::{DbErr, RuntimeErr};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

impl EngineError {
    /// `true` when SQLite refused the statement because another connection
    /// holds the write lock, or the transaction's snapshot went stale.
    pub(crate) fn is_write_conflict(&self) -> bool {
        let Self::Database(DbErr::Conn(err) | DbErr::Exec(err) | DbErr::Query(err)) = self else {
            return false;
        };
        let RuntimeErr::SqlxError(err) = err else {
            return false;
        };
        err.as_database_error()
            .and_then(|db_err| db_err.code())
            .and_then(|code| code.parse::<i32>().ok())
            // Extended codes (BUSY_SNAPSHOT, LOCKED_SHAREDCACHE, ...) keep the
            // primary code in the low byte.
            .is_some_and(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::InvalidOperation(a), Self::InvalidOperation(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_lock_errors_are_write_conflicts() {
        assert!(!EngineError::InvalidOperation("x".to_string()).is_write_conflict());
        assert!(!EngineError::Database(DbErr::RecordNotFound("x".to_string())).is_write_conflict());
        assert!(
            !EngineError::Database(DbErr::Exec(RuntimeErr::Internal("x".to_string())))
                .is_write_conflict()
        );
    }
}
