//! Ledger error types for validation, lookup, lock and cascade failures.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Amount cannot be zero.
    #[error("Amount cannot be zero")]
    ZeroAmount,

    /// Amount cannot be negative.
    #[error("Amount cannot be negative")]
    NegativeAmount,

    /// Year/month pair does not name a calendar month.
    #[error("Invalid period {year}-{month:02}")]
    InvalidPeriod {
        /// Requested year.
        year: i32,
        /// Requested month (1-12).
        month: u32,
    },

    /// Currency code is not on the allow-list.
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// Debt payment would take the remaining amount below zero.
    #[error("Payment of {amount} exceeds remaining amount {remaining} on debt {debt_id}")]
    Overpayment {
        /// The debt being paid.
        debt_id: Uuid,
        /// Remaining amount before the payment.
        remaining: Decimal,
        /// Attempted payment amount.
        amount: Decimal,
    },

    /// Debt total cannot drop below what has already been paid.
    #[error("Debt {debt_id} total {total} is below the paid amount {paid}")]
    TotalBelowPaid {
        /// The debt being updated.
        debt_id: Uuid,
        /// Requested total amount.
        total: Decimal,
        /// Amount already paid.
        paid: Decimal,
    },

    /// Status change is not allowed.
    #[error("Invalid {entity} status transition from {from} to {to}")]
    InvalidStatusTransition {
        /// Entity kind, e.g. "debt".
        entity: &'static str,
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },

    /// Cancelled debts accept no further changes.
    #[error("Debt {0} is cancelled")]
    DebtCancelled(Uuid),

    /// Transfer source and destination are the same account.
    #[error("Cannot transfer between the same account")]
    SameAccountTransfer,

    // ========== Not Found ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// Client not found.
    #[error("Client not found: {0}")]
    ClientNotFound(Uuid),

    /// Invoice not found.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(Uuid),

    /// Payment not found.
    #[error("Payment not found: {0}")]
    PaymentNotFound(Uuid),

    /// Debt not found.
    #[error("Debt not found: {0}")]
    DebtNotFound(Uuid),

    /// Debt payment not found.
    #[error("Debt payment not found: {0}")]
    DebtPaymentNotFound(Uuid),

    /// No financial period recorded for the month.
    #[error("Financial period {year}-{month:02} not found")]
    PeriodNotFound {
        /// Requested year.
        year: i32,
        /// Requested month.
        month: u32,
    },

    // ========== Lock Errors ==========
    /// Payment belongs to a closed period.
    #[error("Payment {0} is locked by a closed period")]
    PaymentLocked(Uuid),

    /// Invoice belongs to a closed period.
    #[error("Invoice {0} is locked by a closed period")]
    InvoiceLocked(Uuid),

    /// Financial period is closed, no writes allowed.
    #[error("Financial period {year}-{month:02} is closed")]
    PeriodClosed {
        /// Period year.
        year: i32,
        /// Period month.
        month: u32,
    },

    // ========== Balance Errors ==========
    /// Source account cannot cover a transfer.
    #[error("Insufficient balance on account {account_id}: available {available}, requested {requested}")]
    InsufficientBalance {
        /// The source account.
        account_id: Uuid,
        /// Current balance.
        available: Decimal,
        /// Requested transfer amount.
        requested: Decimal,
    },

    // ========== Cascade Errors ==========
    /// A cascade step failed; the enclosing transaction was rolled back.
    #[error("Cascade step '{step}' failed, no changes were applied: {message}")]
    CascadeFailed {
        /// Name of the failing step.
        step: &'static str,
        /// Underlying failure.
        message: String,
    },

    /// Concurrent modification detected.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::InvalidPeriod { .. } => "INVALID_PERIOD",
            Self::UnsupportedCurrency(_) => "UNSUPPORTED_CURRENCY",
            Self::Overpayment { .. } => "OVERPAYMENT",
            Self::TotalBelowPaid { .. } => "TOTAL_BELOW_PAID",
            Self::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            Self::DebtCancelled(_) => "DEBT_CANCELLED",
            Self::SameAccountTransfer => "SAME_ACCOUNT_TRANSFER",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::ClientNotFound(_) => "CLIENT_NOT_FOUND",
            Self::InvoiceNotFound(_) => "INVOICE_NOT_FOUND",
            Self::PaymentNotFound(_) => "PAYMENT_NOT_FOUND",
            Self::DebtNotFound(_) => "DEBT_NOT_FOUND",
            Self::DebtPaymentNotFound(_) => "DEBT_PAYMENT_NOT_FOUND",
            Self::PeriodNotFound { .. } => "PERIOD_NOT_FOUND",
            Self::PaymentLocked(_) => "PAYMENT_LOCKED",
            Self::InvoiceLocked(_) => "INVOICE_LOCKED",
            Self::PeriodClosed { .. } => "PERIOD_CLOSED",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::CascadeFailed { .. } => "CASCADE_FAILED",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::ZeroAmount
            | Self::NegativeAmount
            | Self::InvalidPeriod { .. }
            | Self::UnsupportedCurrency(_)
            | Self::Overpayment { .. }
            | Self::TotalBelowPaid { .. }
            | Self::InvalidStatusTransition { .. }
            | Self::DebtCancelled(_)
            | Self::SameAccountTransfer => 400,

            // 404 Not Found
            Self::AccountNotFound(_)
            | Self::ClientNotFound(_)
            | Self::InvoiceNotFound(_)
            | Self::PaymentNotFound(_)
            | Self::DebtNotFound(_)
            | Self::DebtPaymentNotFound(_)
            | Self::PeriodNotFound { .. } => 404,

            // 409 Conflict - concurrency errors
            Self::ConcurrentModification => 409,

            // 422 Unprocessable - business rule
            Self::InsufficientBalance { .. } => 422,

            // 423 Locked - closed periods
            Self::PaymentLocked(_) | Self::InvoiceLocked(_) | Self::PeriodClosed { .. } => 423,

            // 500 Internal Server Error
            Self::CascadeFailed { .. } | Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification)
    }

    /// Returns true if the write was refused because of a period lock.
    #[must_use]
    pub fn is_lock_error(&self) -> bool {
        matches!(
            self,
            Self::PaymentLocked(_) | Self::InvoiceLocked(_) | Self::PeriodClosed { .. }
        )
    }
}
