//! Ledger consistency logic.
//!
//! This module holds everything about money that does not need a database:
//! - Domain enums and the error type
//! - The balance mutation protocol (apply and revert deltas)
//! - The debt status and interest engine
//! - Payment and debt-payment cascade planning
//! - Invoice guards
//! - Financial period windows and totals

pub mod balance;
pub mod debt;
pub mod debt_payment;
pub mod error;
pub mod invoice;
pub mod payment;
pub mod period;
pub mod types;

#[cfg(test)]
mod ledger_props;

pub use balance::{AccountBalance, BalanceDelta, DeltaSign, TransferPlan, plan_transfer, validate_amount};
pub use debt::{DebtAssessment, DebtTerms};
pub use debt_payment::{DebtPaymentCascade, DebtSettlement, payment_number};
pub use error::LedgerError;
pub use payment::{PaymentEffects, PaymentSnapshot};
pub use period::{PeriodKey, PeriodTotals};
pub use types::{
    AccountStatus, AccountType, DebtStatus, InvoiceStatus, InvoiceType, PaymentMethod,
    PaymentStatus, PaymentType, PeriodStatus,
};
