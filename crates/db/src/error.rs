//! Error type for ledger repositories.

use bizledger_core::ledger::LedgerError;
use bizledger_shared::AppError;
use sea_orm::DbErr;

/// Errors returned by the ledger repositories.
#[derive(Debug, thiserror::Error)]
pub enum LedgerStoreError {
    /// A domain rule rejected the operation, or a cascade step failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error outside of a cascade.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl LedgerStoreError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Ledger(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Ledger(e) => e.http_status_code(),
            Self::Database(_) => 500,
        }
    }

    /// Returns the domain error, if any.
    #[must_use]
    pub fn as_ledger(&self) -> Option<&LedgerError> {
        match self {
            Self::Ledger(e) => Some(e),
            Self::Database(_) => None,
        }
    }
}

impl From<LedgerStoreError> for AppError {
    fn from(err: LedgerStoreError) -> Self {
        let message = err.to_string();
        match err {
            LedgerStoreError::Database(_) => Self::Database(message),
            LedgerStoreError::Ledger(e) => match e.http_status_code() {
                404 => Self::NotFound(message),
                400 => Self::Validation(message),
                409 => Self::Conflict(message),
                422 => Self::BusinessRule(message),
                423 => Self::Locked(message),
                _ => Self::Internal(message),
            },
        }
    }
}

/// Tags a database failure with the cascade step it happened in.
pub(crate) trait CascadeStep<T> {
    /// Maps `DbErr` to `LedgerError::CascadeFailed { step, .. }`.
    fn in_step(self, step: &'static str) -> Result<T, LedgerStoreError>;
}

impl<T> CascadeStep<T> for Result<T, DbErr> {
    fn in_step(self, step: &'static str) -> Result<T, LedgerStoreError> {
        self.map_err(|e| {
            LedgerStoreError::Ledger(LedgerError::CascadeFailed {
                step,
                message: e.to_string(),
            })
        })
    }
}
