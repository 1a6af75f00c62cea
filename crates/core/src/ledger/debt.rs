//! Debt status and interest engine.
//!
//! A debt's `remaining_amount` and `status` are never independent truth: they
//! are derived from `(total_amount, paid_amount, due_date, now)` every time a
//! debt is written or read. Interest is a display quantity and is never folded
//! back into `total_amount`.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::balance::validate_amount;
use super::error::LedgerError;
use super::types::DebtStatus;

const MILLIS_PER_DAY: i64 = 86_400_000;
const DAYS_PER_INTEREST_MONTH: i64 = 30;

/// The stored inputs of the derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtTerms {
    /// Original amount owed.
    pub total_amount: Decimal,
    /// Amount paid so far.
    pub paid_amount: Decimal,
    /// When the debt falls due.
    pub due_date: DateTime<Utc>,
    /// Monthly interest rate in percent.
    pub interest_rate: Option<Decimal>,
}

/// Everything derived from [`DebtTerms`] at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtAssessment {
    /// Derived status.
    pub status: DebtStatus,
    /// `total_amount - paid_amount`.
    pub remaining_amount: Decimal,
    /// Started 30-day blocks past the due date.
    pub months_overdue: u32,
    /// Accrued interest on the remaining amount, rounded to a whole unit.
    pub interest_amount: Decimal,
    /// `remaining_amount + interest_amount`.
    pub total_amount_with_interest: Decimal,
}

/// `total - paid`.
#[must_use]
pub fn remaining_amount(total_amount: Decimal, paid_amount: Decimal) -> Decimal {
    total_amount - paid_amount
}

/// Derives the status from amounts and dates.
///
/// Partial payment takes priority over lateness: a late debt with any payment
/// reads as `Partial`.
#[must_use]
pub fn derive_status(
    remaining_amount: Decimal,
    paid_amount: Decimal,
    due_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> DebtStatus {
    if remaining_amount <= Decimal::ZERO {
        DebtStatus::Paid
    } else if paid_amount > Decimal::ZERO {
        DebtStatus::Partial
    } else if now > due_date {
        DebtStatus::Overdue
    } else {
        DebtStatus::Pending
    }
}

/// `ceil(ceil(days late) / 30)`, zero when not late.
#[must_use]
pub fn months_overdue(due_date: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let late_ms = (now - due_date).num_milliseconds();
    if late_ms <= 0 {
        return 0;
    }
    let days = (late_ms + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY;
    let months = (days + DAYS_PER_INTEREST_MONTH - 1) / DAYS_PER_INTEREST_MONTH;
    u32::try_from(months).unwrap_or(u32::MAX)
}

/// `round(remaining * rate * months / 100)`, zero without a positive rate.
#[must_use]
pub fn interest_amount(
    remaining_amount: Decimal,
    interest_rate: Option<Decimal>,
    months_overdue: u32,
) -> Decimal {
    let Some(rate) = interest_rate.filter(|r| *r > Decimal::ZERO) else {
        return Decimal::ZERO;
    };
    if months_overdue == 0 || remaining_amount <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    (remaining_amount * rate * Decimal::from(months_overdue) / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Runs the full derivation.
#[must_use]
pub fn assess(terms: &DebtTerms, now: DateTime<Utc>) -> DebtAssessment {
    let remaining = remaining_amount(terms.total_amount, terms.paid_amount);
    let status = derive_status(remaining, terms.paid_amount, terms.due_date, now);
    let months = months_overdue(terms.due_date, now);
    let interest = interest_amount(remaining, terms.interest_rate, months);

    DebtAssessment {
        status,
        remaining_amount: remaining,
        months_overdue: months,
        interest_amount: interest,
        total_amount_with_interest: remaining + interest,
    }
}

/// Like [`assess`], but keeps an explicit cancellation.
#[must_use]
pub fn assess_stored(terms: &DebtTerms, stored_status: DebtStatus, now: DateTime<Utc>) -> DebtAssessment {
    let assessment = assess(terms, now);
    if stored_status != DebtStatus::Cancelled {
        return assessment;
    }

    DebtAssessment {
        status: DebtStatus::Cancelled,
        months_overdue: 0,
        interest_amount: Decimal::ZERO,
        total_amount_with_interest: assessment.remaining_amount,
        ..assessment
    }
}

/// Validates the amounts of a new debt.
///
/// # Errors
///
/// Returns an amount validation error for a non-positive total.
pub fn validate_new_debt(total_amount: Decimal) -> Result<(), LedgerError> {
    validate_amount(total_amount)
}

/// Applies a payment to a debt and returns the new `paid_amount`.
///
/// # Errors
///
/// Returns an amount validation error, or `Overpayment` if the payment exceeds
/// the remaining amount.
pub fn apply_payment(debt_id: Uuid, terms: &DebtTerms, amount: Decimal) -> Result<Decimal, LedgerError> {
    validate_amount(amount)?;
    let remaining = remaining_amount(terms.total_amount, terms.paid_amount);
    if amount > remaining {
        return Err(LedgerError::Overpayment {
            debt_id,
            remaining,
            amount,
        });
    }
    Ok(terms.paid_amount + amount)
}

/// Change to the client's total debt when a debt's total is edited.
///
/// # Errors
///
/// Returns an amount validation error, or `TotalBelowPaid` if the new total is
/// below what has already been paid.
pub fn total_amount_change(
    debt_id: Uuid,
    terms: &DebtTerms,
    new_total: Decimal,
) -> Result<Decimal, LedgerError> {
    validate_amount(new_total)?;
    if new_total < terms.paid_amount {
        return Err(LedgerError::TotalBelowPaid {
            debt_id,
            total: new_total,
            paid: terms.paid_amount,
        });
    }
    Ok(new_total - terms.total_amount)
}
