//! `SeaORM` entities for the ledger tables.

pub mod prelude;

pub mod accounts;
pub mod clients;
pub mod debt_payment_sequences;
pub mod debt_payments;
pub mod debts;
pub mod financial_periods;
pub mod invoices;
pub mod payments;
pub mod sea_orm_active_enums;
