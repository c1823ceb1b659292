//! The module contains the errors the engine can throw.
//!
//! Every variant belongs to one [`ErrorKind`], the coarse taxonomy the outer
//! layers (HTTP handlers, the admin CLI) switch on:
//!
//! - [`KeyNotFound`] lookups that match zero rows.
//! - [`ExistingKey`] uniqueness (or owner reference) violations.
//! - [`InvalidAmount`] and [`CurrencyMismatch`] inputs rejected by the engine.
//! - [`Database`] and [`Rollback`] any other persistence failure.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`CurrencyMismatch`]: EngineError::CurrencyMismatch
//!  [`Database`]: EngineError::Database
//!  [`Rollback`]: EngineError::Rollback
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error(transparent)]
    Database(#[from] DbErr),
    /// The unit of work failed and rolling it back failed as well.
    #[error("tx err: {error}, rb err: {rollback}")]
    Rollback {
        error: Box<EngineError>,
        rollback: DbErr,
    },
}

/// Coarse classification of [`EngineError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    Unauthorized,
    StorageFailure,
}

impl EngineError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::KeyNotFound(_) => ErrorKind::NotFound,
            Self::ExistingKey(_) => ErrorKind::Conflict,
            Self::InvalidAmount(_) | Self::CurrencyMismatch(_) => ErrorKind::Validation,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Database(_) | Self::Rollback { .. } => ErrorKind::StorageFailure,
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::CurrencyMismatch(a), Self::CurrencyMismatch(b)) => a == b,
            (Self::Unauthorized(a), Self::Unauthorized(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            (
                Self::Rollback {
                    error: a,
                    rollback: ra,
                },
                Self::Rollback {
                    error: b,
                    rollback: rb,
                },
            ) => a == b && ra.to_string() == rb.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollback_failure_reports_both_errors() {
        let err = EngineError::Rollback {
            error: Box::new(EngineError::KeyNotFound("account 9".to_string())),
            rollback: DbErr::Custom("connection closed".to_string()),
        };

        assert_eq!(err.kind(), ErrorKind::StorageFailure);
        let message = err.to_string();
        assert!(message.contains("account 9"));
        assert!(message.contains("connection closed"));
    }

    #[test]
    fn kinds_follow_variants() {
        assert_eq!(
            EngineError::KeyNotFound("x".to_string()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            EngineError::ExistingKey("x".to_string()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            EngineError::CurrencyMismatch("x".to_string()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            EngineError::Database(DbErr::Custom("x".to_string())).kind(),
            ErrorKind::StorageFailure
        );
    }
}
