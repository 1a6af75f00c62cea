//! Payment cascade planning.
//!
//! Turns a payment write (create, update, delete) into the balance deltas and
//! invoice transition it implies. The persistence layer executes the returned
//! [`PaymentEffects`] inside one transaction.

use bizledger_shared::types::{AccountId, InvoiceId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::balance::{BalanceDelta, validate_amount};
use super::error::LedgerError;
use super::types::{PaymentStatus, PaymentType};

/// The ledger-relevant fields of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSnapshot {
    /// Income or expense.
    pub payment_type: PaymentType,
    /// Current status.
    pub status: PaymentStatus,
    /// Unsigned amount.
    pub amount: Decimal,
    /// Account the payment moves money on.
    pub account_id: Option<AccountId>,
    /// Invoice the payment settles.
    pub invoice_id: Option<InvoiceId>,
    /// Frozen by a closed period.
    pub is_locked: bool,
}

impl PaymentSnapshot {
    /// The delta this payment holds on its account while it exists.
    ///
    /// # Errors
    ///
    /// Returns an amount validation error.
    pub fn applied_delta(&self) -> Result<Option<BalanceDelta>, LedgerError> {
        self.account_id
            .map(|account_id| BalanceDelta::for_payment(account_id, self.amount, self.payment_type))
            .transpose()
    }

    /// The invoice this payment settles, if it is a completed income payment.
    #[must_use]
    pub fn settled_invoice(&self) -> Option<InvoiceId> {
        match (self.invoice_id, self.payment_type, self.status) {
            (Some(invoice_id), PaymentType::Income, PaymentStatus::Completed) => Some(invoice_id),
            _ => None,
        }
    }

    fn moves_same_money_as(&self, other: &Self) -> bool {
        self.account_id == other.account_id
            && self.amount == other.amount
            && self.payment_type == other.payment_type
    }
}

/// Side effects of one payment write, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentEffects {
    /// Delta to undo first (the one previously applied).
    pub revert: Option<BalanceDelta>,
    /// Delta to apply afterwards.
    pub apply: Option<BalanceDelta>,
    /// Invoice to flip to `paid`.
    pub mark_invoice_paid: Option<InvoiceId>,
}

impl PaymentEffects {
    /// Balance deltas in the order they must be written.
    pub fn deltas(&self) -> impl Iterator<Item = BalanceDelta> + '_ {
        self.revert
            .iter()
            .map(BalanceDelta::revert)
            .chain(self.apply.iter().copied())
    }

    /// Returns true if the write touches nothing but the payment row.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.revert.is_none() && self.apply.is_none() && self.mark_invoice_paid.is_none()
    }
}

/// Rejects writes against a payment frozen by a closed period.
///
/// # Errors
///
/// Returns `PaymentLocked`.
pub fn ensure_unlocked(payment_id: Uuid, is_locked: bool) -> Result<(), LedgerError> {
    if is_locked {
        return Err(LedgerError::PaymentLocked(payment_id));
    }
    Ok(())
}

/// Effects of creating a payment.
///
/// # Errors
///
/// Returns an amount validation error.
pub fn plan_create(payment: &PaymentSnapshot) -> Result<PaymentEffects, LedgerError> {
    validate_amount(payment.amount)?;
    Ok(PaymentEffects {
        revert: None,
        apply: payment.applied_delta()?,
        mark_invoice_paid: payment.settled_invoice(),
    })
}

/// Effects of replacing `current` with `updated`.
///
/// The previously applied delta is reverted exactly and the new one applied
/// only when account, amount or type changed.
///
/// # Errors
///
/// Returns `PaymentLocked` or an amount validation error.
pub fn plan_update(
    payment_id: Uuid,
    current: &PaymentSnapshot,
    updated: &PaymentSnapshot,
) -> Result<PaymentEffects, LedgerError> {
    ensure_unlocked(payment_id, current.is_locked)?;
    validate_amount(updated.amount)?;

    let (revert, apply) = if current.moves_same_money_as(updated) {
        (None, None)
    } else {
        (current.applied_delta()?, updated.applied_delta()?)
    };

    let mark_invoice_paid = updated
        .settled_invoice()
        .filter(|invoice| current.settled_invoice() != Some(*invoice));

    Ok(PaymentEffects {
        revert,
        apply,
        mark_invoice_paid,
    })
}

/// Effects of deleting a payment.
///
/// # Errors
///
/// Returns `PaymentLocked`.
pub fn plan_delete(payment_id: Uuid, current: &PaymentSnapshot) -> Result<PaymentEffects, LedgerError> {
    ensure_unlocked(payment_id, current.is_locked)?;
    Ok(PaymentEffects {
        revert: current.applied_delta()?,
        apply: None,
        mark_invoice_paid: None,
    })
}
