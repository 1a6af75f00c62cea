//! Balance mutation protocol.
//!
//! Every change to an account balance is a [`BalanceDelta`]: an unsigned amount
//! plus a sign. Undoing a change always uses [`BalanceDelta::revert`] on the
//! delta that was originally applied, never a value recomputed from current
//! state, so repeated updates cannot drift.

use bizledger_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use super::types::PaymentType;

/// Direction of a balance change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaSign {
    /// `+1`: income, transfer-in, debt collection.
    Credit,
    /// `-1`: expense, transfer-out.
    Debit,
}

impl DeltaSign {
    /// Sign of the delta a payment of this type applies.
    #[must_use]
    pub fn for_payment(payment_type: PaymentType) -> Self {
        match payment_type {
            PaymentType::Income => Self::Credit,
            PaymentType::Expense => Self::Debit,
        }
    }

    /// Returns `1` or `-1`.
    #[must_use]
    pub fn factor(self) -> Decimal {
        match self {
            Self::Credit => Decimal::ONE,
            Self::Debit => Decimal::NEGATIVE_ONE,
        }
    }

    /// Returns the opposite sign.
    #[must_use]
    pub fn inverse(self) -> Self {
        match self {
            Self::Credit => Self::Debit,
            Self::Debit => Self::Credit,
        }
    }
}

/// Validates a monetary amount used by any ledger write.
///
/// # Errors
///
/// Returns `ZeroAmount` or `NegativeAmount`.
pub fn validate_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount.is_zero() {
        return Err(LedgerError::ZeroAmount);
    }
    if amount.is_sign_negative() {
        return Err(LedgerError::NegativeAmount);
    }
    Ok(())
}

/// A signed change to one account's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDelta {
    /// Account whose balance changes.
    pub account_id: AccountId,
    /// Unsigned amount (always positive).
    pub amount: Decimal,
    /// Direction.
    pub sign: DeltaSign,
}

impl BalanceDelta {
    /// Creates a delta after validating the amount.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `amount <= 0`.
    pub fn new(account_id: AccountId, amount: Decimal, sign: DeltaSign) -> Result<Self, LedgerError> {
        validate_amount(amount)?;
        Ok(Self {
            account_id,
            amount,
            sign,
        })
    }

    /// The delta a payment applies to its account.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `amount <= 0`.
    pub fn for_payment(
        account_id: AccountId,
        amount: Decimal,
        payment_type: PaymentType,
    ) -> Result<Self, LedgerError> {
        Self::new(account_id, amount, DeltaSign::for_payment(payment_type))
    }

    /// `sign * amount`.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.amount * self.sign.factor()
    }

    /// The exact inverse of this delta.
    #[must_use]
    pub fn revert(&self) -> Self {
        Self {
            account_id: self.account_id,
            amount: self.amount,
            sign: self.sign.inverse(),
        }
    }

    /// Returns `balance + sign * amount`.
    #[must_use]
    pub fn apply_to(&self, balance: Decimal) -> Decimal {
        balance + self.signed_amount()
    }
}

/// In-memory view of an account balance and the deltas applied to it.
///
/// Mirrors the persisted invariant
/// `balance == initial_balance + sum(applied) - sum(reverted)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The account ID.
    pub account_id: AccountId,
    /// Balance the account was opened with.
    pub initial_balance: Decimal,
    /// Current balance.
    pub balance: Decimal,
}

impl AccountBalance {
    /// A freshly created account: `balance = initial_balance`.
    #[must_use]
    pub fn opening(account_id: AccountId, initial_balance: Decimal) -> Self {
        Self {
            account_id,
            initial_balance,
            balance: initial_balance,
        }
    }

    /// Applies a delta aimed at this account. Deltas for other accounts are ignored.
    pub fn apply(&mut self, delta: &BalanceDelta) {
        if delta.account_id == self.account_id {
            self.balance = delta.apply_to(self.balance);
        }
    }

    /// Reverts a previously applied delta.
    pub fn revert(&mut self, delta: &BalanceDelta) {
        self.apply(&delta.revert());
    }

    /// Net change since opening.
    #[must_use]
    pub fn net_change(&self) -> Decimal {
        self.balance - self.initial_balance
    }
}

/// The two deltas of an account-to-account transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferPlan {
    /// Transfer-out on the source account.
    pub outgoing: BalanceDelta,
    /// Transfer-in on the destination account.
    pub incoming: BalanceDelta,
}

/// Validates a transfer and returns the deltas to apply.
///
/// This is the only place the ledger enforces sufficient funds; payment and
/// debt cascades may take an account negative.
///
/// # Errors
///
/// Returns `SameAccountTransfer`, an amount validation error, or
/// `InsufficientBalance` when `source.balance < amount`.
pub fn plan_transfer(
    source: &AccountBalance,
    destination: AccountId,
    amount: Decimal,
) -> Result<TransferPlan, LedgerError> {
    if source.account_id == destination {
        return Err(LedgerError::SameAccountTransfer);
    }
    validate_amount(amount)?;
    if source.balance < amount {
        return Err(LedgerError::InsufficientBalance {
            account_id: source.account_id.into_inner(),
            available: source.balance,
            requested: amount,
        });
    }

    Ok(TransferPlan {
        outgoing: BalanceDelta::new(source.account_id, amount, DeltaSign::Debit)?,
        incoming: BalanceDelta::new(destination, amount, DeltaSign::Credit)?,
    })
}
