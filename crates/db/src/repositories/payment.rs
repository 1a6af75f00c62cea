//! Payment repository: the payment cascade.
//!
//! Each write runs in one transaction: the payment row, the balance deltas it
//! implies and the optional invoice transition commit together or not at all.

use bizledger_core::ledger::{
    self, LedgerError, PaymentEffects, PaymentSnapshot,
    payment::{self as payment_rules},
};
use bizledger_shared::types::{AccountId, InvoiceId, OwnerId, PaymentId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info, warn};

use super::balance::apply_delta;
use super::common::{ensure_period_open, for_update, now, to_stored};
use crate::entities::{
    payments,
    sea_orm_active_enums::{PaymentMethod, PaymentStatus, PaymentType},
};
use crate::error::LedgerStoreError;

/// Input for recording a payment.
#[derive(Debug, Clone)]
pub struct CreatePaymentInput {
    /// Owning tenant.
    pub owner_id: OwnerId,
    /// Income or expense.
    pub payment_type: ledger::PaymentType,
    /// How the money moved.
    pub method: ledger::PaymentMethod,
    /// Initial status.
    pub status: ledger::PaymentStatus,
    /// Unsigned amount.
    pub amount: Decimal,
    /// Free text.
    pub description: Option<String>,
    /// Account whose balance moves.
    pub account_id: Option<AccountId>,
    /// Invoice this payment settles.
    pub invoice_id: Option<InvoiceId>,
    /// Record date for imported payments; defaults to now.
    pub created_at: Option<DateTime<Utc>>,
}

/// Partial payment update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdatePaymentInput {
    /// New direction.
    pub payment_type: Option<ledger::PaymentType>,
    /// New method.
    pub method: Option<ledger::PaymentMethod>,
    /// New status.
    pub status: Option<ledger::PaymentStatus>,
    /// New amount.
    pub amount: Option<Decimal>,
    /// New description.
    pub description: Option<String>,
    /// New account.
    pub account_id: Option<AccountId>,
    /// New invoice.
    pub invoice_id: Option<InvoiceId>,
}

/// Payment repository.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    db: DatabaseConnection,
}

impl PaymentRepository {
    /// Creates a new payment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a payment and runs its cascade.
    ///
    /// # Errors
    ///
    /// Returns an amount validation error, `PeriodClosed`, `AccountNotFound`,
    /// `InvoiceNotFound`, `InvoiceLocked`, `CascadeFailed`, or a database error.
    pub async fn create_payment(
        &self,
        input: CreatePaymentInput,
    ) -> Result<payments::Model, LedgerStoreError> {
        let snapshot = PaymentSnapshot {
            payment_type: input.payment_type,
            status: input.status,
            amount: input.amount,
            account_id: input.account_id,
            invoice_id: input.invoice_id,
            is_locked: false,
        };
        let effects = payment_rules::plan_create(&snapshot)?;
        let recorded_at = input.created_at.unwrap_or_else(Utc::now);

        let txn = self.db.begin().await?;
        ensure_period_open(&txn, input.owner_id, recorded_at).await?;
        ensure_references(&txn, input.owner_id, input.account_id, input.invoice_id).await?;

        let payment = payments::ActiveModel {
            id: Set(PaymentId::new().into_inner()),
            owner_id: Set(input.owner_id.into_inner()),
            payment_type: Set(PaymentType::from(input.payment_type)),
            method: Set(PaymentMethod::from(input.method)),
            status: Set(PaymentStatus::from(input.status)),
            amount: Set(input.amount),
            description: Set(input.description),
            account_id: Set(input.account_id.map(AccountId::into_inner)),
            invoice_id: Set(input.invoice_id.map(InvoiceId::into_inner)),
            is_locked: Set(false),
            created_at: Set(to_stored(recorded_at)),
            updated_at: Set(now()),
        }
        .insert(&txn)
        .await?;

        execute_effects(&txn, input.owner_id, &effects).await?;
        txn.commit().await?;

        info!(
            owner_id = %input.owner_id,
            payment_id = %payment.id,
            amount = %payment.amount,
            payment_type = %input.payment_type,
            "Payment created"
        );
        Ok(payment)
    }

    /// Updates a payment, reverting the old delta and applying the new one.
    ///
    /// # Errors
    ///
    /// Returns `PaymentNotFound`, `PaymentLocked`, an amount validation error,
    /// `AccountNotFound`, `InvoiceNotFound`, `InvoiceLocked`, `CascadeFailed`,
    /// or a database error.
    pub async fn update_payment(
        &self,
        owner_id: OwnerId,
        payment_id: PaymentId,
        input: UpdatePaymentInput,
    ) -> Result<payments::Model, LedgerStoreError> {
        let txn = self.db.begin().await?;
        let current = load(&txn, owner_id, payment_id).await?;
        let before = snapshot_of(&current);
        let after = PaymentSnapshot {
            payment_type: input.payment_type.unwrap_or(before.payment_type),
            status: input.status.unwrap_or(before.status),
            amount: input.amount.unwrap_or(before.amount),
            account_id: input.account_id.or(before.account_id),
            invoice_id: input.invoice_id.or(before.invoice_id),
            is_locked: before.is_locked,
        };

        let effects = payment_rules::plan_update(current.id, &before, &after)
            .inspect_err(|e| log_rejection(payment_id, e))?;
        ensure_references(
            &txn,
            owner_id,
            after.account_id.filter(|a| before.account_id != Some(*a)),
            after.invoice_id.filter(|i| before.invoice_id != Some(*i)),
        )
        .await?;

        let mut active: payments::ActiveModel = current.into();
        active.payment_type = Set(after.payment_type.into());
        active.status = Set(after.status.into());
        active.amount = Set(after.amount);
        active.account_id = Set(after.account_id.map(AccountId::into_inner));
        active.invoice_id = Set(after.invoice_id.map(InvoiceId::into_inner));
        if let Some(method) = input.method {
            active.method = Set(method.into());
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        active.updated_at = Set(now());
        let updated = active.update(&txn).await?;

        execute_effects(&txn, owner_id, &effects).await?;
        txn.commit().await?;

        info!(payment_id = %payment_id, amount = %updated.amount, "Payment updated");
        Ok(updated)
    }

    /// Deletes a payment and reverts its delta.
    ///
    /// # Errors
    ///
    /// Returns `PaymentNotFound`, `PaymentLocked`, `AccountNotFound`,
    /// `CascadeFailed`, or a database error.
    pub async fn delete_payment(
        &self,
        owner_id: OwnerId,
        payment_id: PaymentId,
    ) -> Result<(), LedgerStoreError> {
        let txn = self.db.begin().await?;
        let current = load(&txn, owner_id, payment_id).await?;
        let effects = payment_rules::plan_delete(current.id, &snapshot_of(&current))
            .inspect_err(|e| log_rejection(payment_id, e))?;

        execute_effects(&txn, owner_id, &effects).await?;
        current.delete(&txn).await?;
        txn.commit().await?;

        info!(payment_id = %payment_id, "Payment deleted");
        Ok(())
    }

    /// Finds a payment by ID.
    ///
    /// # Errors
    ///
    /// Returns `PaymentNotFound` or a database error.
    pub async fn find_payment(
        &self,
        owner_id: OwnerId,
        payment_id: PaymentId,
    ) -> Result<payments::Model, LedgerStoreError> {
        payments::Entity::find_by_id(payment_id.into_inner())
            .filter(payments::Column::OwnerId.eq(owner_id.into_inner()))
            .one(&self.db)
            .await?
            .ok_or_else(|| LedgerError::PaymentNotFound(payment_id.into_inner()).into())
    }

    /// Lists an owner's payments, newest first.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_payments(&self, owner_id: OwnerId) -> Result<Vec<payments::Model>, LedgerStoreError> {
        Ok(payments::Entity::find()
            .filter(payments::Column::OwnerId.eq(owner_id.into_inner()))
            .order_by_desc(payments::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }
}

async fn load<C: ConnectionTrait>(
    conn: &C,
    owner_id: OwnerId,
    payment_id: PaymentId,
) -> Result<payments::Model, LedgerStoreError> {
    for_update(
        payments::Entity::find_by_id(payment_id.into_inner())
            .filter(payments::Column::OwnerId.eq(owner_id.into_inner())),
        conn.get_database_backend(),
    )
    .one(conn)
    .await?
    .ok_or_else(|| LedgerError::PaymentNotFound(payment_id.into_inner()).into())
}

/// Fails with `AccountNotFound` or `InvoiceNotFound` before any row is written.
async fn ensure_references<C: ConnectionTrait>(
    conn: &C,
    owner_id: OwnerId,
    account_id: Option<AccountId>,
    invoice_id: Option<InvoiceId>,
) -> Result<(), LedgerStoreError> {
    if let Some(account_id) = account_id {
        super::account::load(conn, owner_id, account_id).await?;
    }
    if let Some(invoice_id) = invoice_id {
        super::invoice::load(conn, owner_id, invoice_id).await?;
    }
    Ok(())
}

fn snapshot_of(payment: &payments::Model) -> PaymentSnapshot {
    PaymentSnapshot {
        payment_type: payment.payment_type.into(),
        status: payment.status.into(),
        amount: payment.amount,
        account_id: payment.account_id.map(AccountId::from_uuid),
        invoice_id: payment.invoice_id.map(InvoiceId::from_uuid),
        is_locked: payment.is_locked,
    }
}

async fn execute_effects<C: ConnectionTrait>(
    conn: &C,
    owner_id: OwnerId,
    effects: &PaymentEffects,
) -> Result<(), LedgerStoreError> {
    if effects.is_noop() {
        debug!("Payment write has no ledger effects");
        return Ok(());
    }
    if let Some(reverted) = &effects.revert {
        apply_delta(conn, owner_id, &reverted.revert(), "payment_revert").await?;
    }
    if let Some(applied) = &effects.apply {
        apply_delta(conn, owner_id, applied, "payment_apply").await?;
    }
    if let Some(invoice_id) = effects.mark_invoice_paid {
        super::invoice::mark_paid(conn, owner_id, invoice_id).await?;
    }
    Ok(())
}

fn log_rejection(payment_id: PaymentId, error: &LedgerError) {
    if error.is_lock_error() {
        warn!(payment_id = %payment_id, "Write rejected, payment is locked");
    }
}
