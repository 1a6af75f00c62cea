//! `SeaORM` entity prelude.

pub use super::accounts::Entity as Accounts;
pub use super::clients::Entity as Clients;
pub use super::debt_payment_sequences::Entity as DebtPaymentSequences;
pub use super::debt_payments::Entity as DebtPayments;
pub use super::debts::Entity as Debts;
pub use super::financial_periods::Entity as FinancialPeriods;
pub use super::invoices::Entity as Invoices;
pub use super::payments::Entity as Payments;
