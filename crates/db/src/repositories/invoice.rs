//! Invoice repository.
//!
//! Every mutation checks `is_locked` first; a closed period freezes the invoice.

use bizledger_core::ledger::{self, InvoiceStatus as DomainInvoiceStatus, LedgerError, invoice};
use bizledger_shared::types::{ClientId, InvoiceId, OwnerId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, warn};

use super::common::{ensure_period_open, for_update, now, parse_currency, to_stored, to_utc};
use crate::entities::{
    invoices, payments,
    sea_orm_active_enums::{InvoiceStatus, InvoiceType},
};
use crate::error::LedgerStoreError;

/// Input for creating an invoice.
#[derive(Debug, Clone)]
pub struct CreateInvoiceInput {
    /// Owning tenant.
    pub owner_id: OwnerId,
    /// Billed client.
    pub client_id: Option<ClientId>,
    /// Human-facing number.
    pub invoice_number: String,
    /// Sent or received.
    pub invoice_type: ledger::InvoiceType,
    /// Initial status, usually draft.
    pub status: DomainInvoiceStatus,
    /// Invoice total.
    pub total: Decimal,
    /// ISO currency code from the allow-list.
    pub currency: String,
    /// Issue date.
    pub issue_date: DateTime<Utc>,
    /// Due date.
    pub due_date: DateTime<Utc>,
    /// Record date for imported invoices; defaults to now.
    pub created_at: Option<DateTime<Utc>>,
}

/// Partial invoice update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateInvoiceInput {
    /// New number.
    pub invoice_number: Option<String>,
    /// New billed client.
    pub client_id: Option<ClientId>,
    /// New total.
    pub total: Option<Decimal>,
    /// New issue date.
    pub issue_date: Option<DateTime<Utc>>,
    /// New due date.
    pub due_date: Option<DateTime<Utc>>,
}

/// An invoice with the status readers should see.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceView {
    /// Stored record.
    pub invoice: invoices::Model,
    /// `sent` past the due date reads as `overdue`.
    pub effective_status: DomainInvoiceStatus,
}

impl InvoiceView {
    fn at(invoice: invoices::Model, now: DateTime<Utc>) -> Self {
        let effective_status =
            invoice::effective_status(invoice.status.into(), to_utc(invoice.due_date), now);
        Self {
            invoice,
            effective_status,
        }
    }
}

/// Invoice repository.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an invoice.
    ///
    /// # Errors
    ///
    /// Returns an amount validation error, `UnsupportedCurrency`,
    /// `ClientNotFound`, `PeriodClosed` if the record month is closed, or a
    /// database error.
    pub async fn create_invoice(
        &self,
        input: CreateInvoiceInput,
    ) -> Result<invoices::Model, LedgerStoreError> {
        ledger::validate_amount(input.total)?;
        let currency = parse_currency(&input.currency)?;
        let recorded_at = input.created_at.unwrap_or_else(Utc::now);

        let txn = self.db.begin().await?;
        ensure_period_open(&txn, input.owner_id, recorded_at).await?;
        if let Some(client_id) = input.client_id {
            super::client::load(&txn, input.owner_id, client_id).await?;
        }

        let invoice = invoices::ActiveModel {
            id: Set(InvoiceId::new().into_inner()),
            owner_id: Set(input.owner_id.into_inner()),
            client_id: Set(input.client_id.map(ClientId::into_inner)),
            invoice_number: Set(input.invoice_number),
            invoice_type: Set(InvoiceType::from(input.invoice_type)),
            status: Set(InvoiceStatus::from(input.status)),
            total: Set(input.total),
            currency: Set(currency.code().to_string()),
            issue_date: Set(to_stored(input.issue_date)),
            due_date: Set(to_stored(input.due_date)),
            is_locked: Set(false),
            created_at: Set(to_stored(recorded_at)),
            updated_at: Set(now()),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        info!(owner_id = %input.owner_id, invoice_id = %invoice.id, total = %invoice.total, "Invoice created");
        Ok(invoice)
    }

    /// Finds an invoice with its effective status.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceNotFound` or a database error.
    pub async fn find_invoice(
        &self,
        owner_id: OwnerId,
        invoice_id: InvoiceId,
        now: DateTime<Utc>,
    ) -> Result<InvoiceView, LedgerStoreError> {
        let invoice = load(&self.db, owner_id, invoice_id).await?;
        Ok(InvoiceView::at(invoice, now))
    }

    /// Lists an owner's invoices, newest first.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_invoices(
        &self,
        owner_id: OwnerId,
        now: DateTime<Utc>,
    ) -> Result<Vec<InvoiceView>, LedgerStoreError> {
        let invoices = invoices::Entity::find()
            .filter(invoices::Column::OwnerId.eq(owner_id.into_inner()))
            .order_by_desc(invoices::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(invoices.into_iter().map(|i| InvoiceView::at(i, now)).collect())
    }

    /// Updates invoice fields.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceNotFound`, `InvoiceLocked`, an amount validation error,
    /// `ClientNotFound`, or a database error.
    pub async fn update_invoice(
        &self,
        owner_id: OwnerId,
        invoice_id: InvoiceId,
        input: UpdateInvoiceInput,
    ) -> Result<invoices::Model, LedgerStoreError> {
        let txn = self.db.begin().await?;
        let current = load_unlocked(&txn, owner_id, invoice_id).await?;
        if let Some(total) = input.total {
            ledger::validate_amount(total)?;
        }
        if let Some(client_id) = input.client_id {
            super::client::load(&txn, owner_id, client_id).await?;
        }

        let mut active: invoices::ActiveModel = current.into();
        if let Some(number) = input.invoice_number {
            active.invoice_number = Set(number);
        }
        if let Some(client_id) = input.client_id {
            active.client_id = Set(Some(client_id.into_inner()));
        }
        if let Some(total) = input.total {
            active.total = Set(total);
        }
        if let Some(issue_date) = input.issue_date {
            active.issue_date = Set(to_stored(issue_date));
        }
        if let Some(due_date) = input.due_date {
            active.due_date = Set(to_stored(due_date));
        }
        active.updated_at = Set(now());
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        info!(invoice_id = %invoice_id, "Invoice updated");
        Ok(updated)
    }

    /// Changes an invoice's status.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceNotFound`, `InvoiceLocked`, `InvalidStatusTransition`,
    /// or a database error.
    pub async fn update_status(
        &self,
        owner_id: OwnerId,
        invoice_id: InvoiceId,
        status: DomainInvoiceStatus,
    ) -> Result<invoices::Model, LedgerStoreError> {
        let txn = self.db.begin().await?;
        let current = load_unlocked(&txn, owner_id, invoice_id).await?;
        invoice::validate_transition(current.status.into(), status)?;

        let mut active: invoices::ActiveModel = current.into();
        active.status = Set(status.into());
        active.updated_at = Set(now());
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        info!(invoice_id = %invoice_id, status = %status, "Invoice status changed");
        Ok(updated)
    }

    /// Deletes an invoice and detaches its payments.
    ///
    /// A locked payment still pointing at the invoice blocks the delete.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceNotFound`, `InvoiceLocked`, `PaymentLocked`, or a
    /// database error.
    pub async fn delete_invoice(
        &self,
        owner_id: OwnerId,
        invoice_id: InvoiceId,
    ) -> Result<(), LedgerStoreError> {
        let txn = self.db.begin().await?;
        let current = load_unlocked(&txn, owner_id, invoice_id).await?;

        let locked_payment = payments::Entity::find()
            .filter(payments::Column::InvoiceId.eq(invoice_id.into_inner()))
            .filter(payments::Column::IsLocked.eq(true))
            .one(&txn)
            .await?;
        if let Some(payment) = locked_payment {
            warn!(invoice_id = %invoice_id, payment_id = %payment.id, "Delete rejected, invoice has a locked payment");
            return Err(LedgerError::PaymentLocked(payment.id).into());
        }

        payments::Entity::update_many()
            .col_expr(payments::Column::InvoiceId, Expr::value(Option::<uuid::Uuid>::None))
            .filter(payments::Column::InvoiceId.eq(invoice_id.into_inner()))
            .exec(&txn)
            .await?;
        current.delete(&txn).await?;
        txn.commit().await?;

        info!(invoice_id = %invoice_id, "Invoice deleted");
        Ok(())
    }
}

/// Loads an owner's invoice or fails with `InvoiceNotFound`.
pub(crate) async fn load<C: ConnectionTrait>(
    conn: &C,
    owner_id: OwnerId,
    invoice_id: InvoiceId,
) -> Result<invoices::Model, LedgerStoreError> {
    for_update(
        invoices::Entity::find_by_id(invoice_id.into_inner())
            .filter(invoices::Column::OwnerId.eq(owner_id.into_inner())),
        conn.get_database_backend(),
    )
    .one(conn)
    .await?
    .ok_or_else(|| LedgerError::InvoiceNotFound(invoice_id.into_inner()).into())
}

/// Loads an invoice for writing; locked invoices are refused.
pub(crate) async fn load_unlocked<C: ConnectionTrait>(
    conn: &C,
    owner_id: OwnerId,
    invoice_id: InvoiceId,
) -> Result<invoices::Model, LedgerStoreError> {
    let current = load(conn, owner_id, invoice_id).await?;
    invoice::ensure_unlocked(current.id, current.is_locked).inspect_err(|_| {
        warn!(invoice_id = %invoice_id, "Write rejected, invoice is locked");
    })?;
    Ok(current)
}

/// Flips an invoice to paid as part of a payment cascade.
///
/// A cancelled invoice cannot be paid, so the whole cascade rolls back.
pub(crate) async fn mark_paid<C: ConnectionTrait>(
    conn: &C,
    owner_id: OwnerId,
    invoice_id: InvoiceId,
) -> Result<(), LedgerStoreError> {
    let current = load_unlocked(conn, owner_id, invoice_id).await?;
    if current.status == InvoiceStatus::Paid {
        return Ok(());
    }
    invoice::validate_transition(current.status.into(), DomainInvoiceStatus::Paid)?;
    let mut active: invoices::ActiveModel = current.into();
    active.status = Set(InvoiceStatus::Paid);
    active.updated_at = Set(now());
    active.update(conn).await?;

    info!(invoice_id = %invoice_id, "Invoice marked paid by payment");
    Ok(())
}
