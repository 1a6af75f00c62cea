//! Integration tests for debts, the debt-payment cascade and client totals.

mod common;

use bizledger_core::ledger::{DebtStatus, LedgerError, PaymentMethod, PaymentStatus};
use bizledger_db::{
    ClientRepository, DebtPaymentRepository, DebtRepository,
    entities::clients,
    repositories::{CreateDebtInput, CreateDebtPaymentInput, UpdateDebtInput},
};
use bizledger_shared::types::{AccountId, ClientId, DebtId, DebtPaymentId, OwnerId};
use chrono::{Duration, Utc};
use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, sea_query::Expr};

use common::{balance_of, create_account, create_client, setup};

struct Fixture {
    db: sea_orm::DatabaseConnection,
    owner: OwnerId,
    account_id: AccountId,
    client_id: ClientId,
}

async fn fixture() -> Fixture {
    let db = setup().await;
    let owner = OwnerId::new();
    let account = create_account(&db, owner, dec!(0)).await;
    let client = create_client(&db, owner).await;
    Fixture {
        owner,
        account_id: AccountId::from_uuid(account.id),
        client_id: ClientId::from_uuid(client.id),
        db,
    }
}

impl Fixture {
    async fn debt(&self, total: Decimal, due_in_days: i64, rate: Option<Decimal>) -> DebtId {
        let debt = DebtRepository::new(self.db.clone())
            .create_debt(CreateDebtInput {
                owner_id: self.owner,
                client_id: self.client_id,
                description: "Equipment lease".to_string(),
                total_amount: total,
                due_date: Utc::now() + Duration::days(due_in_days),
                payment_terms: Some(30),
                interest_rate: rate,
            })
            .await
            .unwrap();
        DebtId::from_uuid(debt.id)
    }

    fn debt_payment(&self, debt_id: DebtId, amount: Decimal, status: PaymentStatus) -> CreateDebtPaymentInput {
        CreateDebtPaymentInput {
            owner_id: self.owner,
            debt_id,
            account_id: self.account_id,
            amount,
            method: PaymentMethod::Cash,
            status,
            notes: None,
        }
    }

    async fn client(&self) -> clients::Model {
        ClientRepository::new(self.db.clone())
            .find_client(self.owner, self.client_id)
            .await
            .unwrap()
    }
}

// ============================================================================
// Debt derivation
// ============================================================================

#[tokio::test]
async fn test_overdue_debt_accrues_one_month_of_interest() {
    let f = fixture().await;
    let debt_id = f.debt(dec!(1000), -10, Some(dec!(5))).await;

    let view = DebtRepository::new(f.db.clone())
        .find_debt(f.owner, debt_id, Utc::now())
        .await
        .unwrap();

    assert_eq!(view.assessment.status, DebtStatus::Overdue);
    assert_eq!(view.assessment.months_overdue, 1);
    assert_eq!(view.assessment.interest_amount, dec!(50));
    assert_eq!(view.assessment.total_amount_with_interest, dec!(1050));
}

#[tokio::test]
async fn test_new_debt_raises_client_total_debt() {
    let f = fixture().await;
    f.debt(dec!(1000), 30, None).await;
    f.debt(dec!(250), 30, None).await;

    assert_eq!(f.client().await.total_debt, dec!(1250));
}

#[tokio::test]
async fn test_total_cannot_drop_below_paid() {
    let f = fixture().await;
    let debt_id = f.debt(dec!(1000), 30, None).await;
    DebtPaymentRepository::new(f.db.clone())
        .create_debt_payment(f.debt_payment(debt_id, dec!(600), PaymentStatus::Completed))
        .await
        .unwrap();

    let err = DebtRepository::new(f.db.clone())
        .update_debt(
            f.owner,
            debt_id,
            UpdateDebtInput {
                total_amount: Some(dec!(500)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err.as_ledger(), Some(LedgerError::TotalBelowPaid { .. })));
}

#[tokio::test]
async fn test_raising_total_moves_client_total_by_difference() {
    let f = fixture().await;
    let debt_id = f.debt(dec!(1000), 30, None).await;

    let updated = DebtRepository::new(f.db.clone())
        .update_debt(
            f.owner,
            debt_id,
            UpdateDebtInput {
                total_amount: Some(dec!(1200)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.remaining_amount, dec!(1200));
    assert_eq!(f.client().await.total_debt, dec!(1200));
}

// ============================================================================
// Debt-payment cascade
// ============================================================================

#[tokio::test]
async fn test_completed_debt_payment_updates_debt_client_and_account() {
    let f = fixture().await;
    let debt_id = f.debt(dec!(1000), 30, None).await;

    let record = DebtPaymentRepository::new(f.db.clone())
        .create_debt_payment(f.debt_payment(debt_id, dec!(300), PaymentStatus::Completed))
        .await
        .unwrap();

    assert_eq!(record.payment_number, "DP-000001");
    assert!(record.completed_at.is_some());

    let view = DebtRepository::new(f.db.clone())
        .find_debt(f.owner, debt_id, Utc::now())
        .await
        .unwrap();
    assert_eq!(view.debt.paid_amount, dec!(300));
    assert_eq!(view.debt.remaining_amount, dec!(700));
    assert_eq!(view.assessment.status, DebtStatus::Partial);

    let client = f.client().await;
    assert_eq!(client.total_debt, dec!(700));
    assert_eq!(client.total_paid, dec!(300));
    assert_eq!(balance_of(&f.db, f.owner, f.account_id).await, dec!(300));
}

#[tokio::test]
async fn test_pending_debt_payment_applies_only_on_completion() {
    let f = fixture().await;
    let debt_id = f.debt(dec!(1000), 30, None).await;
    let repo = DebtPaymentRepository::new(f.db.clone());

    let record = repo
        .create_debt_payment(f.debt_payment(debt_id, dec!(200), PaymentStatus::Pending))
        .await
        .unwrap();
    assert_eq!(balance_of(&f.db, f.owner, f.account_id).await, dec!(0));
    assert_eq!(f.client().await.total_debt, dec!(1000));

    repo.complete(f.owner, DebtPaymentId::from_uuid(record.id))
        .await
        .unwrap();
    assert_eq!(balance_of(&f.db, f.owner, f.account_id).await, dec!(200));
    assert_eq!(f.client().await.total_debt, dec!(800));
}

#[tokio::test]
async fn test_completing_twice_changes_nothing() {
    let f = fixture().await;
    let debt_id = f.debt(dec!(1000), 30, None).await;
    let repo = DebtPaymentRepository::new(f.db.clone());

    let record = repo
        .create_debt_payment(f.debt_payment(debt_id, dec!(300), PaymentStatus::Completed))
        .await
        .unwrap();
    repo.complete(f.owner, DebtPaymentId::from_uuid(record.id))
        .await
        .unwrap();

    assert_eq!(balance_of(&f.db, f.owner, f.account_id).await, dec!(300));
    assert_eq!(f.client().await.total_paid, dec!(300));
}

#[tokio::test]
async fn test_leaving_completed_is_rejected() {
    let f = fixture().await;
    let debt_id = f.debt(dec!(1000), 30, None).await;
    let repo = DebtPaymentRepository::new(f.db.clone());

    let record = repo
        .create_debt_payment(f.debt_payment(debt_id, dec!(300), PaymentStatus::Completed))
        .await
        .unwrap();
    let err = repo
        .update_status(f.owner, DebtPaymentId::from_uuid(record.id), PaymentStatus::Cancelled)
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "INVALID_STATUS_TRANSITION");
}

#[tokio::test]
async fn test_overpayment_is_rejected() {
    let f = fixture().await;
    let debt_id = f.debt(dec!(500), 30, None).await;

    let err = DebtPaymentRepository::new(f.db.clone())
        .create_debt_payment(f.debt_payment(debt_id, dec!(501), PaymentStatus::Completed))
        .await
        .unwrap_err();

    assert!(matches!(err.as_ledger(), Some(LedgerError::Overpayment { .. })));
    assert_eq!(balance_of(&f.db, f.owner, f.account_id).await, dec!(0));
}

#[tokio::test]
async fn test_completion_against_cancelled_debt_rolls_back() {
    let f = fixture().await;
    let debt_id = f.debt(dec!(1000), 30, None).await;
    let repo = DebtPaymentRepository::new(f.db.clone());

    let record = repo
        .create_debt_payment(f.debt_payment(debt_id, dec!(300), PaymentStatus::Pending))
        .await
        .unwrap();
    DebtRepository::new(f.db.clone())
        .cancel_debt(f.owner, debt_id)
        .await
        .unwrap();

    let err = repo
        .complete(f.owner, DebtPaymentId::from_uuid(record.id))
        .await
        .unwrap_err();
    assert!(matches!(err.as_ledger(), Some(LedgerError::DebtCancelled(_))));

    let unchanged = repo
        .find_debt_payment(f.owner, DebtPaymentId::from_uuid(record.id))
        .await
        .unwrap();
    assert_eq!(PaymentStatus::from(unchanged.status), PaymentStatus::Pending);
    assert_eq!(balance_of(&f.db, f.owner, f.account_id).await, dec!(0));
}

#[tokio::test]
async fn test_payment_numbers_are_sequential_per_owner() {
    let f = fixture().await;
    let debt_id = f.debt(dec!(1000), 30, None).await;
    let repo = DebtPaymentRepository::new(f.db.clone());

    for _ in 0..3 {
        repo.create_debt_payment(f.debt_payment(debt_id, dec!(100), PaymentStatus::Pending))
            .await
            .unwrap();
    }

    let numbers: Vec<String> = repo
        .list_for_debt(f.owner, debt_id)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.payment_number)
        .collect();
    assert_eq!(numbers.len(), 3);
    assert!(numbers.contains(&"DP-000001".to_string()));
    assert!(numbers.contains(&"DP-000003".to_string()));
}

#[tokio::test]
async fn test_concurrent_debt_payments_get_distinct_numbers() {
    let f = fixture().await;
    let debt_id = f.debt(dec!(1000), 30, None).await;
    let repo = DebtPaymentRepository::new(f.db.clone());

    let writes = (0..10).map(|_| {
        let repo = repo.clone();
        let input = f.debt_payment(debt_id, dec!(10), PaymentStatus::Pending);
        async move { repo.create_debt_payment(input).await }
    });
    let results = join_all(writes).await;
    assert!(results.iter().all(Result::is_ok));

    let mut numbers: Vec<String> = repo
        .list_for_debt(f.owner, debt_id)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.payment_number)
        .collect();
    numbers.sort();
    let expected: Vec<String> = (1..=10).map(|n| format!("DP-{n:06}")).collect();
    assert_eq!(numbers, expected);
}

#[tokio::test]
async fn test_payment_numbers_restart_for_each_owner() {
    let first = fixture().await;
    let debt_id = first.debt(dec!(1000), 30, None).await;
    DebtPaymentRepository::new(first.db.clone())
        .create_debt_payment(first.debt_payment(debt_id, dec!(10), PaymentStatus::Pending))
        .await
        .unwrap();

    let other_owner = OwnerId::new();
    let account = create_account(&first.db, other_owner, dec!(0)).await;
    let client = create_client(&first.db, other_owner).await;
    let other = Fixture {
        db: first.db.clone(),
        owner: other_owner,
        account_id: AccountId::from_uuid(account.id),
        client_id: ClientId::from_uuid(client.id),
    };
    let other_debt = other.debt(dec!(500), 30, None).await;
    let record = DebtPaymentRepository::new(other.db.clone())
        .create_debt_payment(other.debt_payment(other_debt, dec!(10), PaymentStatus::Pending))
        .await
        .unwrap();

    assert_eq!(record.payment_number, "DP-000001");
}

// ============================================================================
// Settlement / cancellation
// ============================================================================

#[tokio::test]
async fn test_mark_paid_settles_remaining() {
    let f = fixture().await;
    let debt_id = f.debt(dec!(1000), 30, None).await;
    DebtPaymentRepository::new(f.db.clone())
        .create_debt_payment(f.debt_payment(debt_id, dec!(400), PaymentStatus::Completed))
        .await
        .unwrap();

    let debt = DebtRepository::new(f.db.clone())
        .mark_paid(f.owner, debt_id)
        .await
        .unwrap();

    assert_eq!(debt.paid_amount, dec!(1000));
    assert_eq!(debt.remaining_amount, dec!(0));
    let client = f.client().await;
    assert_eq!(client.total_debt, dec!(0));
    assert_eq!(client.total_paid, dec!(1000));
}

#[tokio::test]
async fn test_derived_status_cannot_be_requested() {
    let f = fixture().await;
    let debt_id = f.debt(dec!(1000), 30, None).await;

    let err = DebtRepository::new(f.db.clone())
        .update_status(f.owner, debt_id, DebtStatus::Overdue)
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "INVALID_STATUS_TRANSITION");
}

#[tokio::test]
async fn test_refresh_statuses_flags_newly_overdue_debts() {
    let f = fixture().await;
    f.debt(dec!(1000), 5, None).await;
    f.debt(dec!(1000), 60, None).await;

    let changed = DebtRepository::new(f.db.clone())
        .refresh_statuses(f.owner, Utc::now() + Duration::days(10))
        .await
        .unwrap();

    assert_eq!(changed, 1);
}

// ============================================================================
// Reconciliation
// ============================================================================

#[tokio::test]
async fn test_reconcile_rewrites_drifted_totals() {
    let f = fixture().await;
    let open = f.debt(dec!(1000), 30, None).await;
    let cancelled = f.debt(dec!(500), 30, None).await;
    DebtPaymentRepository::new(f.db.clone())
        .create_debt_payment(f.debt_payment(open, dec!(300), PaymentStatus::Completed))
        .await
        .unwrap();
    DebtRepository::new(f.db.clone())
        .cancel_debt(f.owner, cancelled)
        .await
        .unwrap();

    clients::Entity::update_many()
        .col_expr(clients::Column::TotalDebt, Expr::value(Decimal::ZERO))
        .col_expr(clients::Column::TotalPaid, Expr::value(Decimal::ZERO))
        .filter(clients::Column::Id.eq(f.client_id.into_inner()))
        .exec(&f.db)
        .await
        .unwrap();

    let client = ClientRepository::new(f.db.clone())
        .reconcile_totals(f.owner, f.client_id)
        .await
        .unwrap();

    assert_eq!(client.total_debt, dec!(700));
    assert_eq!(client.total_paid, dec!(300));
}
