//! Debt-payment repository: the debt-payment cascade.
//!
//! Completing a debt payment writes the debt, the client's totals and the
//! paying account inside the same transaction as the status change.

use bizledger_core::ledger::{
    self, DebtPaymentCascade, LedgerError, debt::DebtTerms, debt_payment as cascade_rules,
};
use bizledger_shared::types::{AccountId, ClientId, DebtId, DebtPaymentId, OwnerId};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info};

use super::balance::{adjust_client_totals, apply_delta};
use super::common::{for_update, now};
use super::debt::{terms_of, write_assessment};
use crate::entities::{
    debt_payment_sequences, debt_payments, debts,
    sea_orm_active_enums::{DebtStatus, PaymentMethod, PaymentStatus},
};
use crate::error::LedgerStoreError;

/// Input for recording a payment against a debt.
#[derive(Debug, Clone)]
pub struct CreateDebtPaymentInput {
    /// Owning tenant.
    pub owner_id: OwnerId,
    /// Debt being paid.
    pub debt_id: DebtId,
    /// Account receiving the money.
    pub account_id: AccountId,
    /// Amount paid.
    pub amount: Decimal,
    /// How the money moved.
    pub method: ledger::PaymentMethod,
    /// Initial status; `completed` runs the cascade immediately.
    pub status: ledger::PaymentStatus,
    /// Free text.
    pub notes: Option<String>,
}

/// Debt-payment repository.
#[derive(Debug, Clone)]
pub struct DebtPaymentRepository {
    db: DatabaseConnection,
}

impl DebtPaymentRepository {
    /// Creates a new debt-payment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a debt payment with the next `DP-` number.
    ///
    /// # Errors
    ///
    /// Returns `DebtNotFound`, `AccountNotFound`, an amount validation error,
    /// `DebtCancelled`, `Overpayment`, `CascadeFailed`, or a database error.
    pub async fn create_debt_payment(
        &self,
        input: CreateDebtPaymentInput,
    ) -> Result<debt_payments::Model, LedgerStoreError> {
        ledger::validate_amount(input.amount)?;

        let txn = self.db.begin().await?;
        let debt = super::debt::load(&txn, input.owner_id, input.debt_id).await?;
        super::account::load(&txn, input.owner_id, input.account_id).await?;
        if debt.status == DebtStatus::Cancelled {
            return Err(LedgerError::DebtCancelled(debt.id).into());
        }
        ledger::debt::apply_payment(debt.id, &terms_of(&debt), input.amount)?;

        let sequence = next_sequence(&txn, input.owner_id).await?;
        let timestamp = now();

        let record = debt_payments::ActiveModel {
            id: Set(DebtPaymentId::new().into_inner()),
            owner_id: Set(input.owner_id.into_inner()),
            payment_number: Set(cascade_rules::payment_number(sequence)),
            debt_id: Set(debt.id),
            client_id: Set(debt.client_id),
            account_id: Set(input.account_id.into_inner()),
            amount: Set(input.amount),
            method: Set(PaymentMethod::from(input.method)),
            status: Set(PaymentStatus::Pending),
            notes: Set(input.notes),
            completed_at: Set(None),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        }
        .insert(&txn)
        .await?;

        info!(
            owner_id = %input.owner_id,
            debt_payment_id = %record.id,
            payment_number = %record.payment_number,
            amount = %record.amount,
            "Debt payment created"
        );

        let record = transition(&txn, input.owner_id, record, input.status).await?;
        txn.commit().await?;
        Ok(record)
    }

    /// Changes a debt payment's status, running the cascade on completion.
    ///
    /// Completing an already completed payment changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `DebtPaymentNotFound`, `InvalidStatusTransition` when leaving
    /// `completed`, plus the cascade errors of [`Self::complete`].
    pub async fn update_status(
        &self,
        owner_id: OwnerId,
        debt_payment_id: DebtPaymentId,
        status: ledger::PaymentStatus,
    ) -> Result<debt_payments::Model, LedgerStoreError> {
        let txn = self.db.begin().await?;
        let record = load(&txn, owner_id, debt_payment_id).await?;
        let record = transition(&txn, owner_id, record, status).await?;
        txn.commit().await?;
        Ok(record)
    }

    /// Completes a debt payment.
    ///
    /// # Errors
    ///
    /// Returns `DebtPaymentNotFound`, `DebtNotFound`, `DebtCancelled`,
    /// `Overpayment`, `ClientNotFound`, `AccountNotFound`, `CascadeFailed`, or
    /// a database error.
    pub async fn complete(
        &self,
        owner_id: OwnerId,
        debt_payment_id: DebtPaymentId,
    ) -> Result<debt_payments::Model, LedgerStoreError> {
        self.update_status(owner_id, debt_payment_id, ledger::PaymentStatus::Completed)
            .await
    }

    /// Finds a debt payment by ID.
    ///
    /// # Errors
    ///
    /// Returns `DebtPaymentNotFound` or a database error.
    pub async fn find_debt_payment(
        &self,
        owner_id: OwnerId,
        debt_payment_id: DebtPaymentId,
    ) -> Result<debt_payments::Model, LedgerStoreError> {
        debt_payments::Entity::find_by_id(debt_payment_id.into_inner())
            .filter(debt_payments::Column::OwnerId.eq(owner_id.into_inner()))
            .one(&self.db)
            .await?
            .ok_or_else(|| LedgerError::DebtPaymentNotFound(debt_payment_id.into_inner()).into())
    }

    /// Lists the payments recorded against a debt, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_for_debt(
        &self,
        owner_id: OwnerId,
        debt_id: DebtId,
    ) -> Result<Vec<debt_payments::Model>, LedgerStoreError> {
        Ok(debt_payments::Entity::find()
            .filter(debt_payments::Column::OwnerId.eq(owner_id.into_inner()))
            .filter(debt_payments::Column::DebtId.eq(debt_id.into_inner()))
            .order_by_asc(debt_payments::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }
}

async fn load<C: ConnectionTrait>(
    conn: &C,
    owner_id: OwnerId,
    debt_payment_id: DebtPaymentId,
) -> Result<debt_payments::Model, LedgerStoreError> {
    for_update(
        debt_payments::Entity::find_by_id(debt_payment_id.into_inner())
            .filter(debt_payments::Column::OwnerId.eq(owner_id.into_inner())),
        conn.get_database_backend(),
    )
    .one(conn)
    .await?
    .ok_or_else(|| LedgerError::DebtPaymentNotFound(debt_payment_id.into_inner()).into())
}

/// Reserves the owner's next debt-payment sequence number.
///
/// The upsert holds the counter row's lock until commit, so concurrent
/// creates for one owner take turns and never share a number.
async fn next_sequence<C: ConnectionTrait>(conn: &C, owner_id: OwnerId) -> Result<u64, LedgerStoreError> {
    let bump = OnConflict::column(debt_payment_sequences::Column::OwnerId)
        .value(
            debt_payment_sequences::Column::LastValue,
            Expr::col((
                debt_payment_sequences::Entity,
                debt_payment_sequences::Column::LastValue,
            ))
            .add(1),
        )
        .to_owned();

    debt_payment_sequences::Entity::insert(debt_payment_sequences::ActiveModel {
        owner_id: Set(owner_id.into_inner()),
        last_value: Set(1),
    })
    .on_conflict(bump)
    .exec_without_returning(conn)
    .await?;

    let counter = debt_payment_sequences::Entity::find_by_id(owner_id.into_inner())
        .one(conn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound("debt_payment_sequences".to_string()))?;
    debug!(owner_id = %owner_id, sequence = counter.last_value, "Reserved debt payment number");
    Ok(u64::try_from(counter.last_value).unwrap_or_default())
}

/// Moves a debt payment to `requested`, running the cascade when it completes.
async fn transition<C: ConnectionTrait>(
    conn: &C,
    owner_id: OwnerId,
    record: debt_payments::Model,
    requested: ledger::PaymentStatus,
) -> Result<debt_payments::Model, LedgerStoreError> {
    let current: ledger::PaymentStatus = record.status.into();
    if current == requested {
        debug!(debt_payment_id = %record.id, status = %requested, "Status unchanged");
        return Ok(record);
    }
    let completes = cascade_rules::completes(current, requested)?;

    if completes {
        run_cascade(conn, owner_id, &record).await?;
    }

    let mut active: debt_payments::ActiveModel = record.into();
    active.status = Set(requested.into());
    if completes {
        active.completed_at = Set(Some(now()));
    }
    active.updated_at = Set(now());
    Ok(active.update(conn).await?)
}

/// Writes the four aggregates a completed debt payment moves.
async fn run_cascade<C: ConnectionTrait>(
    conn: &C,
    owner_id: OwnerId,
    record: &debt_payments::Model,
) -> Result<DebtPaymentCascade, LedgerStoreError> {
    let debt = super::debt::load(conn, owner_id, DebtId::from_uuid(record.debt_id)).await?;
    let terms: DebtTerms = terms_of(&debt);
    let plan = cascade_rules::plan_completion(
        DebtId::from_uuid(debt.id),
        &terms,
        debt.status.into(),
        ClientId::from_uuid(debt.client_id),
        AccountId::from_uuid(record.account_id),
        record.amount,
        Utc::now(),
    )?;

    let after = DebtTerms {
        paid_amount: plan.debt_paid_amount,
        ..terms
    };
    let assessment = ledger::debt::assess(&after, Utc::now());
    let mut active: debts::ActiveModel = debt.into();
    active.paid_amount = Set(plan.debt_paid_amount);
    write_assessment(conn, active, &assessment).await?;
    debug!(debt_id = %plan.debt_id, paid_amount = %plan.debt_paid_amount, "Debt paid amount updated");

    adjust_client_totals(
        conn,
        owner_id,
        plan.client_id,
        plan.client_total_debt_delta,
        plan.client_total_paid_delta,
        "client_totals",
    )
    .await?;
    apply_delta(conn, owner_id, &plan.account_delta, "account_balance").await?;

    info!(
        debt_payment_id = %record.id,
        debt_id = %plan.debt_id,
        client_id = %plan.client_id,
        amount = %record.amount,
        "Debt payment cascade applied"
    );
    Ok(plan)
}
