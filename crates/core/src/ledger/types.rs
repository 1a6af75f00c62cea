//! Ledger domain enums shared by every cascade.

use serde::{Deserialize, Serialize};

/// Kind of money account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// Bank account.
    Bank,
    /// Cash box.
    Cash,
    /// Credit card.
    CreditCard,
    /// Savings account.
    Savings,
    /// Anything else.
    Other,
}

/// Account lifecycle. Accounts are never deleted; closing is a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Account is in use.
    Active,
    /// Account is temporarily unused.
    Inactive,
    /// Account is closed.
    Closed,
}

/// Direction of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceType {
    /// Issued to a client.
    Sent,
    /// Received from a supplier.
    Received,
}

/// Invoice status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Being prepared.
    Draft,
    /// Issued and awaiting payment.
    Sent,
    /// Settled.
    Paid,
    /// Past its due date and unpaid.
    Overdue,
    /// Voided.
    Cancelled,
}

/// Direction of a payment, which fixes the sign of its balance delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// Money coming in.
    Income,
    /// Money going out.
    Expense,
}

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash.
    Cash,
    /// Bank transfer.
    BankTransfer,
    /// Credit card.
    CreditCard,
    /// Cheque.
    Check,
    /// Anything else.
    Other,
}

/// Payment status. Shared by `Payment` and `DebtPayment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Not yet settled.
    Pending,
    /// Settled.
    Completed,
    /// Attempted and failed.
    Failed,
    /// Withdrawn.
    Cancelled,
}

impl PaymentStatus {
    /// Returns true for the settled state.
    #[must_use]
    pub fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Debt status. All variants except `Cancelled` are derived from amounts and dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtStatus {
    /// Nothing paid, not yet due.
    Pending,
    /// Partly paid.
    Partial,
    /// Fully paid.
    Paid,
    /// Nothing paid and past due.
    Overdue,
    /// Written off explicitly.
    Cancelled,
}

impl DebtStatus {
    /// Returns true if the debt still counts towards the client's total debt.
    #[must_use]
    pub fn is_open(self) -> bool {
        !matches!(self, Self::Paid | Self::Cancelled)
    }
}

/// Financial period status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodStatus {
    /// Records in the month can still change.
    Open,
    /// Records in the month are frozen.
    Closed,
}

macro_rules! status_names {
    ($($ty:ident { $($variant:ident => $name:literal),+ $(,)? })+) => {
        $(
            impl $ty {
                /// Stored and wire name of the variant.
                #[must_use]
                pub fn as_str(self) -> &'static str {
                    match self {
                        $(Self::$variant => $name,)+
                    }
                }
            }

            impl std::fmt::Display for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )+
    };
}

status_names! {
    AccountType { Bank => "bank", Cash => "cash", CreditCard => "credit_card", Savings => "savings", Other => "other" }
    AccountStatus { Active => "active", Inactive => "inactive", Closed => "closed" }
    InvoiceType { Sent => "sent", Received => "received" }
    InvoiceStatus { Draft => "draft", Sent => "sent", Paid => "paid", Overdue => "overdue", Cancelled => "cancelled" }
    PaymentType { Income => "income", Expense => "expense" }
    PaymentMethod { Cash => "cash", BankTransfer => "bank_transfer", CreditCard => "credit_card", Check => "check", Other => "other" }
    PaymentStatus { Pending => "pending", Completed => "completed", Failed => "failed", Cancelled => "cancelled" }
    DebtStatus { Pending => "pending", Partial => "partial", Paid => "paid", Overdue => "overdue", Cancelled => "cancelled" }
    PeriodStatus { Open => "open", Closed => "closed" }
}
