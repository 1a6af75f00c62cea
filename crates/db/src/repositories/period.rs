//! Financial period repository: the period-closing coordinator.
//!
//! Closing a month computes its totals from the owner's invoices and payments,
//! stores them on the period row and locks every unlocked invoice and payment
//! created in the month, all in one transaction. The lock covers one owner or
//! every owner depending on [`PeriodLockScope`]. A global close also stores a
//! closed period, with its own totals, for every other owner active in the
//! month, so their new records are refused as well.

use std::collections::HashSet;

use bizledger_core::ledger::{LedgerError, PeriodKey, PeriodTotals};
use bizledger_shared::PeriodLockScope;
use bizledger_shared::types::OwnerId;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::common::{for_update, month_column, now, to_stored};
use crate::entities::{financial_periods, invoices, payments, sea_orm_active_enums::PeriodStatus};
use crate::error::{CascadeStep, LedgerStoreError};

/// Result of closing a period.
#[derive(Debug, Clone, Serialize)]
pub struct ClosedPeriod {
    /// Stored period with its totals.
    pub period: financial_periods::Model,
    /// Invoices newly locked by this call.
    pub invoices_locked: u64,
    /// Payments newly locked by this call.
    pub payments_locked: u64,
}

/// Financial period repository.
#[derive(Debug, Clone)]
pub struct PeriodRepository {
    db: DatabaseConnection,
    lock_scope: PeriodLockScope,
}

impl PeriodRepository {
    /// Creates a new period repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, lock_scope: PeriodLockScope) -> Self {
        Self { db, lock_scope }
    }

    /// Closes `year`/`month` for an owner.
    ///
    /// Closing again recomputes the same totals and locks nothing new.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriod`, `CascadeFailed`, or a database error.
    pub async fn close_period(
        &self,
        owner_id: OwnerId,
        year: i32,
        month: u32,
    ) -> Result<ClosedPeriod, LedgerStoreError> {
        let key = PeriodKey::new(year, month)?;
        let (start, end) = key.bounds()?;
        let (start, end) = (to_stored(start), to_stored(end));

        let txn = self.db.begin().await?;

        let (period, totals) = close_for_owner(&txn, owner_id, key, start, end).await?;

        if self.lock_scope == PeriodLockScope::Global {
            for other in owners_active_in(&txn, start, end).await? {
                if other != owner_id {
                    close_for_owner(&txn, other, key, start, end).await?;
                }
            }
        }

        let lock_owner = match self.lock_scope {
            PeriodLockScope::Owner => Some(owner_id.into_inner()),
            PeriodLockScope::Global => None,
        };

        let mut lock_invoices = invoices::Entity::update_many()
            .col_expr(invoices::Column::IsLocked, Expr::value(true))
            .filter(invoices::Column::IsLocked.eq(false))
            .filter(invoices::Column::CreatedAt.gte(start))
            .filter(invoices::Column::CreatedAt.lt(end));
        if let Some(owner) = lock_owner {
            lock_invoices = lock_invoices.filter(invoices::Column::OwnerId.eq(owner));
        }
        let invoices_locked = lock_invoices.exec(&txn).await.in_step("lock_invoices")?.rows_affected;

        let mut lock_payments = payments::Entity::update_many()
            .col_expr(payments::Column::IsLocked, Expr::value(true))
            .filter(payments::Column::IsLocked.eq(false))
            .filter(payments::Column::CreatedAt.gte(start))
            .filter(payments::Column::CreatedAt.lt(end));
        if let Some(owner) = lock_owner {
            lock_payments = lock_payments.filter(payments::Column::OwnerId.eq(owner));
        }
        let payments_locked = lock_payments.exec(&txn).await.in_step("lock_payments")?.rows_affected;

        txn.commit().await?;

        info!(
            owner_id = %owner_id,
            period = %key,
            net_income = %totals.net_income,
            invoices_locked,
            payments_locked,
            scope = ?self.lock_scope,
            "Financial period closed"
        );
        Ok(ClosedPeriod {
            period,
            invoices_locked,
            payments_locked,
        })
    }

    /// Finds an owner's period.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriod`, `PeriodNotFound`, or a database error.
    pub async fn find_period(
        &self,
        owner_id: OwnerId,
        year: i32,
        month: u32,
    ) -> Result<financial_periods::Model, LedgerStoreError> {
        let key = PeriodKey::new(year, month)?;
        find(&self.db, owner_id, key)
            .await?
            .ok_or_else(|| LedgerError::PeriodNotFound { year, month }.into())
    }

    /// Lists an owner's periods, latest first.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_periods(
        &self,
        owner_id: OwnerId,
    ) -> Result<Vec<financial_periods::Model>, LedgerStoreError> {
        Ok(financial_periods::Entity::find()
            .filter(financial_periods::Column::OwnerId.eq(owner_id.into_inner()))
            .order_by_desc(financial_periods::Column::Year)
            .order_by_desc(financial_periods::Column::Month)
            .all(&self.db)
            .await?)
    }
}

/// Computes an owner's totals for the month and stores the period as closed.
async fn close_for_owner<C: ConnectionTrait>(
    conn: &C,
    owner_id: OwnerId,
    key: PeriodKey,
    start: DateTimeWithTimeZone,
    end: DateTimeWithTimeZone,
) -> Result<(financial_periods::Model, PeriodTotals), LedgerStoreError> {
    let invoice_count = invoices::Entity::find()
        .filter(invoices::Column::OwnerId.eq(owner_id.into_inner()))
        .filter(invoices::Column::CreatedAt.gte(start))
        .filter(invoices::Column::CreatedAt.lt(end))
        .count(conn)
        .await
        .in_step("period_totals")?;

    let month_payments = payments::Entity::find()
        .filter(payments::Column::OwnerId.eq(owner_id.into_inner()))
        .filter(payments::Column::CreatedAt.gte(start))
        .filter(payments::Column::CreatedAt.lt(end))
        .all(conn)
        .await
        .in_step("period_totals")?;

    let totals = PeriodTotals::compute(
        invoice_count,
        month_payments
            .iter()
            .map(|p| (p.payment_type.into(), p.status.into(), p.amount)),
    );
    debug!(owner_id = %owner_id, period = %key, ?totals, "Period totals computed");

    let period = upsert_closed(conn, owner_id, key, &totals).await?;
    Ok((period, totals))
}

/// Owners with at least one invoice or payment recorded in `[start, end)`.
async fn owners_active_in<C: ConnectionTrait>(
    conn: &C,
    start: DateTimeWithTimeZone,
    end: DateTimeWithTimeZone,
) -> Result<HashSet<OwnerId>, LedgerStoreError> {
    let invoice_owners: Vec<Uuid> = invoices::Entity::find()
        .select_only()
        .column(invoices::Column::OwnerId)
        .distinct()
        .filter(invoices::Column::CreatedAt.gte(start))
        .filter(invoices::Column::CreatedAt.lt(end))
        .into_tuple()
        .all(conn)
        .await
        .in_step("period_owners")?;

    let payment_owners: Vec<Uuid> = payments::Entity::find()
        .select_only()
        .column(payments::Column::OwnerId)
        .distinct()
        .filter(payments::Column::CreatedAt.gte(start))
        .filter(payments::Column::CreatedAt.lt(end))
        .into_tuple()
        .all(conn)
        .await
        .in_step("period_owners")?;

    Ok(invoice_owners
        .into_iter()
        .chain(payment_owners)
        .map(OwnerId::from_uuid)
        .collect())
}

async fn find<C: ConnectionTrait>(
    conn: &C,
    owner_id: OwnerId,
    key: PeriodKey,
) -> Result<Option<financial_periods::Model>, LedgerStoreError> {
    Ok(for_update(
        financial_periods::Entity::find()
            .filter(financial_periods::Column::OwnerId.eq(owner_id.into_inner()))
            .filter(financial_periods::Column::Year.eq(key.year()))
            .filter(financial_periods::Column::Month.eq(month_column(key))),
        conn.get_database_backend(),
    )
    .one(conn)
    .await?)
}

/// Stores `totals` on the period row and marks it closed, creating the row on demand.
async fn upsert_closed<C: ConnectionTrait>(
    conn: &C,
    owner_id: OwnerId,
    key: PeriodKey,
    totals: &PeriodTotals,
) -> Result<financial_periods::Model, LedgerStoreError> {
    let timestamp = now();
    let total_invoices = i64::try_from(totals.total_invoices).unwrap_or(i64::MAX);
    let total_payments = i64::try_from(totals.total_payments).unwrap_or(i64::MAX);

    let saved = match find(conn, owner_id, key).await? {
        Some(existing) => {
            let closed_at = existing.closed_at.unwrap_or(timestamp);
            let mut active: financial_periods::ActiveModel = existing.into();
            active.status = Set(PeriodStatus::Closed);
            active.total_invoices = Set(total_invoices);
            active.total_payments = Set(total_payments);
            active.total_income = Set(totals.total_income);
            active.total_expenses = Set(totals.total_expenses);
            active.net_income = Set(totals.net_income);
            active.closed_at = Set(Some(closed_at));
            active.updated_at = Set(timestamp);
            active.update(conn).await
        }
        None => {
            financial_periods::ActiveModel {
                id: Set(Uuid::now_v7()),
                owner_id: Set(owner_id.into_inner()),
                year: Set(key.year()),
                month: Set(month_column(key)),
                status: Set(PeriodStatus::Closed),
                total_invoices: Set(total_invoices),
                total_payments: Set(total_payments),
                total_income: Set(totals.total_income),
                total_expenses: Set(totals.total_expenses),
                net_income: Set(totals.net_income),
                closed_at: Set(Some(timestamp)),
                created_at: Set(timestamp),
                updated_at: Set(timestamp),
            }
            .insert(conn)
            .await
        }
    };
    saved.in_step("period_upsert")
}
