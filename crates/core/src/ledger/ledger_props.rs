//! Property-based tests for the balance protocol and the debt engine.

use bizledger_shared::types::AccountId;
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::balance::AccountBalance;
use super::debt::{self, DebtTerms};
use super::payment::{self, PaymentSnapshot};
use super::types::{DebtStatus, PaymentStatus, PaymentType};

/// Amounts from 0.01 to 1,000,000.00.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn payment_type_strategy() -> impl Strategy<Value = PaymentType> {
    prop_oneof![Just(PaymentType::Income), Just(PaymentType::Expense)]
}

#[derive(Debug, Clone)]
enum PaymentOp {
    Create(PaymentType, Decimal),
    Update(usize, PaymentType, Decimal),
    Delete(usize),
}

fn payment_op() -> impl Strategy<Value = PaymentOp> {
    prop_oneof![
        (payment_type_strategy(), positive_amount()).prop_map(|(t, a)| PaymentOp::Create(t, a)),
        (any::<usize>(), payment_type_strategy(), positive_amount())
            .prop_map(|(i, t, a)| PaymentOp::Update(i, t, a)),
        any::<usize>().prop_map(PaymentOp::Delete),
    ]
}

fn snapshot(account_id: AccountId, payment_type: PaymentType, amount: Decimal) -> PaymentSnapshot {
    PaymentSnapshot {
        payment_type,
        status: PaymentStatus::Completed,
        amount,
        account_id: Some(account_id),
        invoice_id: None,
        is_locked: false,
    }
}

fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Balance equals the opening balance plus the signed amounts of live payments
    /// after any sequence of create, update and delete.
    #[test]
    fn prop_balance_tracks_live_payments(
        initial in positive_amount(),
        ops in prop::collection::vec(payment_op(), 0..40),
    ) {
        let account_id = AccountId::new();
        let mut account = AccountBalance::opening(account_id, initial);
        let mut live: Vec<PaymentSnapshot> = Vec::new();

        for op in ops {
            let effects = match op {
                PaymentOp::Create(t, a) => {
                    let created = snapshot(account_id, t, a);
                    live.push(created);
                    payment::plan_create(&created).unwrap()
                }
                PaymentOp::Update(i, t, a) if !live.is_empty() => {
                    let idx = i % live.len();
                    let updated = snapshot(account_id, t, a);
                    let effects = payment::plan_update(Uuid::new_v4(), &live[idx], &updated).unwrap();
                    live[idx] = updated;
                    effects
                }
                PaymentOp::Delete(i) if !live.is_empty() => {
                    let removed = live.remove(i % live.len());
                    payment::plan_delete(Uuid::new_v4(), &removed).unwrap()
                }
                _ => continue,
            };
            for delta in effects.deltas() {
                account.apply(&delta);
            }
        }

        let expected: Decimal = initial
            + live
                .iter()
                .map(|p| p.applied_delta().unwrap().map_or(Decimal::ZERO, |d| d.signed_amount()))
                .sum::<Decimal>();
        prop_assert_eq!(account.balance, expected);
    }

    /// Remaining amount never goes negative through accepted payments.
    #[test]
    fn prop_debt_remaining_never_negative(
        total in positive_amount(),
        payments in prop::collection::vec(positive_amount(), 0..20),
    ) {
        let mut terms = DebtTerms {
            total_amount: total,
            paid_amount: Decimal::ZERO,
            due_date: reference_now(),
            interest_rate: None,
        };
        for amount in payments {
            if let Ok(paid) = debt::apply_payment(Uuid::new_v4(), &terms, amount) {
                terms.paid_amount = paid;
            }
            let assessment = debt::assess(&terms, reference_now());
            prop_assert_eq!(assessment.remaining_amount, terms.total_amount - terms.paid_amount);
            prop_assert!(assessment.remaining_amount >= Decimal::ZERO);
        }
    }

    /// Status derivation is a pure function of its inputs.
    #[test]
    fn prop_status_is_deterministic(
        total in positive_amount(),
        paid_cents in 0i64..100_000_000i64,
        offset_hours in -5_000i64..5_000i64,
    ) {
        let paid = Decimal::new(paid_cents, 2).min(total);
        let now = reference_now();
        let due = now + Duration::hours(offset_hours);
        let remaining = debt::remaining_amount(total, paid);

        let first = debt::derive_status(remaining, paid, due, now);
        let second = debt::derive_status(remaining, paid, due, now);
        prop_assert_eq!(first, second);

        if paid > Decimal::ZERO && remaining > Decimal::ZERO {
            prop_assert_eq!(first, DebtStatus::Partial);
        }
        if remaining <= Decimal::ZERO {
            prop_assert_eq!(first, DebtStatus::Paid);
        }
    }

    /// Interest is zero whenever the debt is not late.
    #[test]
    fn prop_no_interest_before_due(
        total in positive_amount(),
        rate_bp in 0i64..10_000i64,
        hours_until_due in 0i64..10_000i64,
    ) {
        let now = reference_now();
        let terms = DebtTerms {
            total_amount: total,
            paid_amount: Decimal::ZERO,
            due_date: now + Duration::hours(hours_until_due),
            interest_rate: Some(Decimal::new(rate_bp, 2)),
        };
        let assessment = debt::assess(&terms, now);
        prop_assert_eq!(assessment.interest_amount, Decimal::ZERO);
        prop_assert_eq!(assessment.total_amount_with_interest, total);
    }
}
