//! Integration tests for closing financial periods and lock enforcement.

mod common;

use bizledger_core::ledger::{InvoiceStatus, InvoiceType, LedgerError, PaymentType};
use bizledger_db::{
    InvoiceRepository, PaymentRepository, PeriodRepository,
    repositories::{CreateInvoiceInput, UpdateInvoiceInput, UpdatePaymentInput},
};
use bizledger_shared::PeriodLockScope;
use bizledger_shared::types::{AccountId, InvoiceId, OwnerId, PaymentId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;

use common::{completed_payment, create_account, on, setup};

async fn record_payment(
    db: &DatabaseConnection,
    owner: OwnerId,
    account_id: AccountId,
    payment_type: PaymentType,
    amount: Decimal,
    at: DateTime<Utc>,
) -> PaymentId {
    let mut input = completed_payment(owner, account_id, payment_type, amount);
    input.created_at = Some(at);
    let payment = PaymentRepository::new(db.clone())
        .create_payment(input)
        .await
        .unwrap();
    PaymentId::from_uuid(payment.id)
}

async fn record_invoice(db: &DatabaseConnection, owner: OwnerId, at: DateTime<Utc>) -> InvoiceId {
    let invoice = InvoiceRepository::new(db.clone())
        .create_invoice(CreateInvoiceInput {
            owner_id: owner,
            client_id: None,
            invoice_number: "INV-2024-03".to_string(),
            invoice_type: InvoiceType::Sent,
            status: InvoiceStatus::Sent,
            total: dec!(500),
            currency: "USD".to_string(),
            issue_date: at,
            due_date: at,
            created_at: Some(at),
        })
        .await
        .unwrap();
    InvoiceId::from_uuid(invoice.id)
}

/// March 2024 with one income, one expense and one invoice, plus an April payment.
async fn seeded_march(db: &DatabaseConnection, owner: OwnerId) -> (AccountId, PaymentId, InvoiceId) {
    let account_id = AccountId::from_uuid(create_account(db, owner, dec!(1000)).await.id);
    let income = record_payment(db, owner, account_id, PaymentType::Income, dec!(500), on(2024, 3, 10)).await;
    record_payment(db, owner, account_id, PaymentType::Expense, dec!(200), on(2024, 3, 31)).await;
    record_payment(db, owner, account_id, PaymentType::Income, dec!(999), on(2024, 4, 1)).await;
    let invoice = record_invoice(db, owner, on(2024, 3, 15)).await;
    (account_id, income, invoice)
}

// ============================================================================
// Totals
// ============================================================================

#[tokio::test]
async fn test_close_computes_totals_and_locks_month() {
    let db = setup().await;
    let owner = OwnerId::new();
    seeded_march(&db, owner).await;

    let closed = PeriodRepository::new(db.clone(), PeriodLockScope::Owner)
        .close_period(owner, 2024, 3)
        .await
        .unwrap();

    assert_eq!(closed.period.total_income, dec!(500));
    assert_eq!(closed.period.total_expenses, dec!(200));
    assert_eq!(closed.period.net_income, dec!(300));
    assert_eq!(closed.period.total_payments, 2);
    assert_eq!(closed.period.total_invoices, 1);
    assert_eq!(closed.payments_locked, 2);
    assert_eq!(closed.invoices_locked, 1);
    assert!(closed.period.closed_at.is_some());
}

#[tokio::test]
async fn test_closing_again_recomputes_and_locks_nothing_new() {
    let db = setup().await;
    let owner = OwnerId::new();
    seeded_march(&db, owner).await;
    let periods = PeriodRepository::new(db.clone(), PeriodLockScope::Owner);

    let first = periods.close_period(owner, 2024, 3).await.unwrap();
    let second = periods.close_period(owner, 2024, 3).await.unwrap();

    assert_eq!(second.period.id, first.period.id);
    assert_eq!(second.period.net_income, first.period.net_income);
    assert_eq!(second.period.closed_at, first.period.closed_at);
    assert_eq!(second.payments_locked, 0);
    assert_eq!(second.invoices_locked, 0);
    assert_eq!(periods.list_periods(owner).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_month_closes_with_zero_totals() {
    let db = setup().await;
    let owner = OwnerId::new();

    let closed = PeriodRepository::new(db.clone(), PeriodLockScope::Owner)
        .close_period(owner, 2023, 12)
        .await
        .unwrap();

    assert_eq!(closed.period.net_income, dec!(0));
    assert_eq!(closed.period.total_payments, 0);
}

#[tokio::test]
async fn test_invalid_month_is_rejected() {
    let db = setup().await;

    let err = PeriodRepository::new(db.clone(), PeriodLockScope::Owner)
        .close_period(OwnerId::new(), 2024, 13)
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "INVALID_PERIOD");
}

#[tokio::test]
async fn test_find_missing_period() {
    let db = setup().await;

    let err = PeriodRepository::new(db.clone(), PeriodLockScope::Owner)
        .find_period(OwnerId::new(), 2024, 3)
        .await
        .unwrap_err();

    assert!(matches!(err.as_ledger(), Some(LedgerError::PeriodNotFound { year: 2024, month: 3 })));
}

// ============================================================================
// Lock enforcement
// ============================================================================

#[tokio::test]
async fn test_locked_payment_rejects_update_and_delete() {
    let db = setup().await;
    let owner = OwnerId::new();
    let (_, income, _) = seeded_march(&db, owner).await;
    PeriodRepository::new(db.clone(), PeriodLockScope::Owner)
        .close_period(owner, 2024, 3)
        .await
        .unwrap();
    let payments = PaymentRepository::new(db.clone());

    let err = payments
        .update_payment(
            owner,
            income,
            UpdatePaymentInput {
                amount: Some(dec!(1)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err.as_ledger(), Some(LedgerError::PaymentLocked(_))));

    let err = payments.delete_payment(owner, income).await.unwrap_err();
    assert!(matches!(err.as_ledger(), Some(LedgerError::PaymentLocked(_))));

    let unchanged = payments.find_payment(owner, income).await.unwrap();
    assert_eq!(unchanged.amount, dec!(500));
}

#[tokio::test]
async fn test_locked_invoice_rejects_writes() {
    let db = setup().await;
    let owner = OwnerId::new();
    let (_, _, invoice) = seeded_march(&db, owner).await;
    PeriodRepository::new(db.clone(), PeriodLockScope::Owner)
        .close_period(owner, 2024, 3)
        .await
        .unwrap();
    let invoices = InvoiceRepository::new(db.clone());

    let err = invoices
        .update_invoice(
            owner,
            invoice,
            UpdateInvoiceInput {
                total: Some(dec!(1)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INVOICE_LOCKED");

    let err = invoices.delete_invoice(owner, invoice).await.unwrap_err();
    assert_eq!(err.error_code(), "INVOICE_LOCKED");
}

#[tokio::test]
async fn test_closed_month_rejects_new_records() {
    let db = setup().await;
    let owner = OwnerId::new();
    let (account_id, _, _) = seeded_march(&db, owner).await;
    PeriodRepository::new(db.clone(), PeriodLockScope::Owner)
        .close_period(owner, 2024, 3)
        .await
        .unwrap();

    let mut input = completed_payment(owner, account_id, PaymentType::Income, dec!(10));
    input.created_at = Some(on(2024, 3, 20));
    let err = PaymentRepository::new(db.clone())
        .create_payment(input)
        .await
        .unwrap_err();

    assert!(matches!(err.as_ledger(), Some(LedgerError::PeriodClosed { year: 2024, month: 3 })));
}

#[tokio::test]
async fn test_following_month_stays_writable() {
    let db = setup().await;
    let owner = OwnerId::new();
    seeded_march(&db, owner).await;
    PeriodRepository::new(db.clone(), PeriodLockScope::Owner)
        .close_period(owner, 2024, 3)
        .await
        .unwrap();

    let april = PaymentRepository::new(db.clone())
        .list_payments(owner)
        .await
        .unwrap()
        .into_iter()
        .find(|p| p.amount == dec!(999))
        .unwrap();

    assert!(!april.is_locked);
}

// ============================================================================
// Lock scope
// ============================================================================

#[tokio::test]
async fn test_owner_scope_leaves_other_owners_unlocked() {
    let db = setup().await;
    let (owner, other) = (OwnerId::new(), OwnerId::new());
    seeded_march(&db, owner).await;
    let (_, other_income, _) = seeded_march(&db, other).await;

    let closed = PeriodRepository::new(db.clone(), PeriodLockScope::Owner)
        .close_period(owner, 2024, 3)
        .await
        .unwrap();

    assert_eq!(closed.payments_locked, 2);
    let untouched = PaymentRepository::new(db.clone())
        .find_payment(other, other_income)
        .await
        .unwrap();
    assert!(!untouched.is_locked);
}

#[tokio::test]
async fn test_global_scope_locks_every_owner() {
    let db = setup().await;
    let (owner, other) = (OwnerId::new(), OwnerId::new());
    seeded_march(&db, owner).await;
    let (_, other_income, _) = seeded_march(&db, other).await;

    let closed = PeriodRepository::new(db.clone(), PeriodLockScope::Global)
        .close_period(owner, 2024, 3)
        .await
        .unwrap();

    assert_eq!(closed.payments_locked, 4);
    assert_eq!(closed.invoices_locked, 2);
    // Totals stay scoped to the closing owner.
    assert_eq!(closed.period.net_income, dec!(300));
    let locked = PaymentRepository::new(db.clone())
        .find_payment(other, other_income)
        .await
        .unwrap();
    assert!(locked.is_locked);
}

#[tokio::test]
async fn test_global_close_closes_month_for_other_owners() {
    let db = setup().await;
    let (owner, other) = (OwnerId::new(), OwnerId::new());
    seeded_march(&db, owner).await;
    let (other_account, _, _) = seeded_march(&db, other).await;
    let periods = PeriodRepository::new(db.clone(), PeriodLockScope::Global);

    periods.close_period(owner, 2024, 3).await.unwrap();

    let other_period = periods.find_period(other, 2024, 3).await.unwrap();
    assert!(other_period.closed_at.is_some());
    assert_eq!(other_period.net_income, dec!(300));
    assert_eq!(other_period.total_payments, 2);

    let mut input = completed_payment(other, other_account, PaymentType::Income, dec!(10));
    input.created_at = Some(on(2024, 3, 21));
    let err = PaymentRepository::new(db.clone())
        .create_payment(input)
        .await
        .unwrap_err();
    assert!(matches!(err.as_ledger(), Some(LedgerError::PeriodClosed { year: 2024, month: 3 })));
}

#[tokio::test]
async fn test_owner_close_leaves_other_owners_open() {
    let db = setup().await;
    let (owner, other) = (OwnerId::new(), OwnerId::new());
    seeded_march(&db, owner).await;
    seeded_march(&db, other).await;
    let periods = PeriodRepository::new(db.clone(), PeriodLockScope::Owner);

    periods.close_period(owner, 2024, 3).await.unwrap();

    let err = periods.find_period(other, 2024, 3).await.unwrap_err();
    assert_eq!(err.error_code(), "PERIOD_NOT_FOUND");
}
