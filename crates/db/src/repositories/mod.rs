//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for ledger operations, hiding the
//! `SeaORM` implementation details from the rest of the application. Every
//! cascade runs inside a single database transaction.

pub mod account;
pub mod client;
pub mod debt;
pub mod debt_payment;
pub mod invoice;
pub mod payment;
pub mod period;

mod balance;
mod common;

pub use account::{AccountRepository, CreateAccountInput, TransferInput, TransferResult};
pub use client::{ClientRepository, CreateClientInput};
pub use debt::{CreateDebtInput, DebtRepository, DebtView, UpdateDebtInput};
pub use debt_payment::{CreateDebtPaymentInput, DebtPaymentRepository};
pub use invoice::{CreateInvoiceInput, InvoiceRepository, InvoiceView, UpdateInvoiceInput};
pub use payment::{CreatePaymentInput, PaymentRepository, UpdatePaymentInput};
pub use period::{ClosedPeriod, PeriodRepository};
