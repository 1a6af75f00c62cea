//! Debt-payment cascade planning.
//!
//! Completing a debt payment moves four aggregates together: the debt's paid
//! amount, the client's total paid, the client's total debt and the paying
//! account's balance. [`plan_completion`] decides whether a status change
//! triggers that cascade and computes every figure up front.

use bizledger_shared::types::{AccountId, ClientId, DebtId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::balance::{BalanceDelta, DeltaSign};
use super::debt::{self, DebtTerms};
use super::error::LedgerError;
use super::types::{DebtStatus, PaymentStatus};

const PAYMENT_NUMBER_PREFIX: &str = "DP-";

/// Formats the human-facing number of the `sequence`-th debt payment.
///
/// ```
/// use bizledger_core::ledger::payment_number;
/// assert_eq!(payment_number(7), "DP-000007");
/// ```
#[must_use]
pub fn payment_number(sequence: u64) -> String {
    format!("{PAYMENT_NUMBER_PREFIX}{sequence:06}")
}

/// Checks a debt-payment status change and reports whether it completes the payment.
///
/// Returns `Ok(true)` only for a transition into `completed`. Setting
/// `completed` again is `Ok(false)` so the cascade runs once.
///
/// # Errors
///
/// Returns `InvalidStatusTransition` when leaving `completed`.
pub fn completes(current: PaymentStatus, requested: PaymentStatus) -> Result<bool, LedgerError> {
    match (current, requested) {
        (PaymentStatus::Completed, PaymentStatus::Completed) => Ok(false),
        (PaymentStatus::Completed, other) => Err(LedgerError::InvalidStatusTransition {
            entity: "debt_payment",
            from: current.to_string(),
            to: other.to_string(),
        }),
        (_, PaymentStatus::Completed) => Ok(true),
        _ => Ok(false),
    }
}

/// Everything one debt-payment completion writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtPaymentCascade {
    /// Debt receiving the payment.
    pub debt_id: DebtId,
    /// Debt's new paid amount.
    pub debt_paid_amount: Decimal,
    /// Debt's new derived status.
    pub debt_status: DebtStatus,
    /// Client whose totals move.
    pub client_id: ClientId,
    /// Added to `client.total_paid`.
    pub client_total_paid_delta: Decimal,
    /// Added to `client.total_debt` (negative).
    pub client_total_debt_delta: Decimal,
    /// Credit on the paying account.
    pub account_delta: BalanceDelta,
}

/// Plans the completion cascade for a debt payment of `amount`.
///
/// # Errors
///
/// Returns `DebtCancelled` for a cancelled debt, an amount validation error,
/// or `Overpayment` if `amount` exceeds the remaining amount.
pub fn plan_completion(
    debt_id: DebtId,
    terms: &DebtTerms,
    debt_status: DebtStatus,
    client_id: ClientId,
    account_id: AccountId,
    amount: Decimal,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<DebtPaymentCascade, LedgerError> {
    if debt_status == DebtStatus::Cancelled {
        return Err(LedgerError::DebtCancelled(debt_id.into_inner()));
    }
    let paid_amount = debt::apply_payment(debt_id.into_inner(), terms, amount)?;
    let remaining = debt::remaining_amount(terms.total_amount, paid_amount);
    let status = debt::derive_status(remaining, paid_amount, terms.due_date, now);

    Ok(DebtPaymentCascade {
        debt_id,
        debt_paid_amount: paid_amount,
        debt_status: status,
        client_id,
        client_total_paid_delta: amount,
        client_total_debt_delta: -amount,
        account_delta: BalanceDelta::new(account_id, amount, DeltaSign::Credit)?,
    })
}

/// Writes produced by settling a debt in full (`markDebtPaid`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtSettlement {
    /// New paid amount, equal to the total.
    pub paid_amount: Decimal,
    /// Amount settled by this call, added to `total_paid` and removed from `total_debt`.
    pub settled_amount: Decimal,
}

/// Plans marking a debt fully paid.
///
/// An already paid debt settles zero.
///
/// # Errors
///
/// Returns `DebtCancelled` for a cancelled debt.
pub fn plan_settlement(
    debt_id: DebtId,
    terms: &DebtTerms,
    debt_status: DebtStatus,
) -> Result<DebtSettlement, LedgerError> {
    if debt_status == DebtStatus::Cancelled {
        return Err(LedgerError::DebtCancelled(debt_id.into_inner()));
    }
    let remaining = debt::remaining_amount(terms.total_amount, terms.paid_amount);
    Ok(DebtSettlement {
        paid_amount: terms.total_amount,
        settled_amount: remaining.max(Decimal::ZERO),
    })
}

/// Amount removed from the client's total debt when a debt is cancelled.
///
/// # Errors
///
/// Returns `DebtCancelled` if the debt is already cancelled.
pub fn plan_cancellation(
    debt_id: DebtId,
    terms: &DebtTerms,
    debt_status: DebtStatus,
) -> Result<Decimal, LedgerError> {
    if debt_status == DebtStatus::Cancelled {
        return Err(LedgerError::DebtCancelled(debt_id.into_inner()));
    }
    Ok(debt::remaining_amount(terms.total_amount, terms.paid_amount).max(Decimal::ZERO))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn terms(total: Decimal, paid: Decimal) -> DebtTerms {
        DebtTerms {
            total_amount: total,
            paid_amount: paid,
            due_date: Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
            interest_rate: None,
        }
    }

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    #[rstest]
    #[case(1, "DP-000001")]
    #[case(42, "DP-000042")]
    #[case(1_234_567, "DP-1234567")]
    fn test_payment_number(#[case] sequence: u64, #[case] expected: &str) {
        assert_eq!(payment_number(sequence), expected);
    }

    #[rstest]
    #[case(PaymentStatus::Pending, PaymentStatus::Completed, true)]
    #[case(PaymentStatus::Failed, PaymentStatus::Completed, true)]
    #[case(PaymentStatus::Pending, PaymentStatus::Failed, false)]
    #[case(PaymentStatus::Completed, PaymentStatus::Completed, false)]
    fn test_completes(
        #[case] current: PaymentStatus,
        #[case] requested: PaymentStatus,
        #[case] expected: bool,
    ) {
        assert_eq!(completes(current, requested).unwrap(), expected);
    }

    #[test]
    fn test_leaving_completed_is_rejected() {
        let err = completes(PaymentStatus::Completed, PaymentStatus::Pending).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidStatusTransition { entity: "debt_payment", .. }));
    }

    #[test]
    fn test_completion_moves_all_four_aggregates() {
        let account = AccountId::new();
        let cascade = plan_completion(
            DebtId::new(),
            &terms(dec!(1000), dec!(0)),
            DebtStatus::Pending,
            ClientId::new(),
            account,
            dec!(300),
            now(),
        )
        .unwrap();

        assert_eq!(cascade.debt_paid_amount, dec!(300));
        assert_eq!(cascade.debt_status, DebtStatus::Partial);
        assert_eq!(cascade.client_total_paid_delta, dec!(300));
        assert_eq!(cascade.client_total_debt_delta, dec!(-300));
        assert_eq!(cascade.account_delta.account_id, account);
        assert_eq!(cascade.account_delta.signed_amount(), dec!(300));
    }

    #[test]
    fn test_final_payment_marks_debt_paid() {
        let cascade = plan_completion(
            DebtId::new(),
            &terms(dec!(1000), dec!(700)),
            DebtStatus::Partial,
            ClientId::new(),
            AccountId::new(),
            dec!(300),
            now() + Duration::days(60),
        )
        .unwrap();
        assert_eq!(cascade.debt_status, DebtStatus::Paid);
    }

    #[test]
    fn test_completion_rejects_overpayment() {
        let result = plan_completion(
            DebtId::new(),
            &terms(dec!(1000), dec!(900)),
            DebtStatus::Partial,
            ClientId::new(),
            AccountId::new(),
            dec!(150),
            now(),
        );
        assert!(matches!(result, Err(LedgerError::Overpayment { .. })));
    }

    #[test]
    fn test_completion_rejects_cancelled_debt() {
        let result = plan_completion(
            DebtId::new(),
            &terms(dec!(1000), dec!(0)),
            DebtStatus::Cancelled,
            ClientId::new(),
            AccountId::new(),
            dec!(10),
            now(),
        );
        assert!(matches!(result, Err(LedgerError::DebtCancelled(_))));
    }

    #[test]
    fn test_settlement_uses_remaining_amount() {
        let settlement =
            plan_settlement(DebtId::new(), &terms(dec!(1000), dec!(250)), DebtStatus::Partial).unwrap();
        assert_eq!(settlement.paid_amount, dec!(1000));
        assert_eq!(settlement.settled_amount, dec!(750));

        let again =
            plan_settlement(DebtId::new(), &terms(dec!(1000), dec!(1000)), DebtStatus::Paid).unwrap();
        assert_eq!(again.settled_amount, Decimal::ZERO);
    }

    #[test]
    fn test_cancellation() {
        assert_eq!(
            plan_cancellation(DebtId::new(), &terms(dec!(500), dec!(100)), DebtStatus::Partial).unwrap(),
            dec!(400)
        );
        assert!(matches!(
            plan_cancellation(DebtId::new(), &terms(dec!(500), dec!(0)), DebtStatus::Cancelled),
            Err(LedgerError::DebtCancelled(_))
        ));
    }
}
