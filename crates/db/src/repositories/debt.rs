//! Debt repository.
//!
//! Stored `remaining_amount` and `status` are rewritten from the debt engine on
//! every write, in the same transaction that moves the client's totals.

use bizledger_core::ledger::{
    self, DebtAssessment, DebtTerms, LedgerError,
    debt::{self as debt_engine},
    debt_payment as settlement,
};
use bizledger_shared::types::{ClientId, DebtId, OwnerId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{debug, info};

use super::balance::adjust_client_totals;
use super::common::{for_update, now, to_stored, to_utc};
use crate::entities::{debts, sea_orm_active_enums::DebtStatus};
use crate::error::LedgerStoreError;

/// Input for creating a debt.
#[derive(Debug, Clone)]
pub struct CreateDebtInput {
    /// Owning tenant.
    pub owner_id: OwnerId,
    /// Debtor.
    pub client_id: ClientId,
    /// Free text.
    pub description: String,
    /// Amount owed.
    pub total_amount: Decimal,
    /// When the debt falls due.
    pub due_date: DateTime<Utc>,
    /// Payment terms in days.
    pub payment_terms: Option<i32>,
    /// Monthly interest rate in percent.
    pub interest_rate: Option<Decimal>,
}

/// Partial debt update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateDebtInput {
    /// New description.
    pub description: Option<String>,
    /// New total; the client's total debt moves by the difference.
    pub total_amount: Option<Decimal>,
    /// New due date.
    pub due_date: Option<DateTime<Utc>>,
    /// New payment terms.
    pub payment_terms: Option<i32>,
    /// New monthly interest rate.
    pub interest_rate: Option<Decimal>,
}

/// A debt together with its assessment at read time.
#[derive(Debug, Clone, Serialize)]
pub struct DebtView {
    /// Stored record.
    pub debt: debts::Model,
    /// Derived status, overdue months and interest.
    pub assessment: DebtAssessment,
}

impl DebtView {
    fn at(debt: debts::Model, now: DateTime<Utc>) -> Self {
        let assessment = debt_engine::assess_stored(&terms_of(&debt), debt.status.into(), now);
        Self { debt, assessment }
    }
}

/// Debt repository.
#[derive(Debug, Clone)]
pub struct DebtRepository {
    db: DatabaseConnection,
}

impl DebtRepository {
    /// Creates a new debt repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a debt and adds its total to the client's total debt.
    ///
    /// # Errors
    ///
    /// Returns an amount validation error, `ClientNotFound`, `CascadeFailed`,
    /// or a database error.
    pub async fn create_debt(&self, input: CreateDebtInput) -> Result<debts::Model, LedgerStoreError> {
        debt_engine::validate_new_debt(input.total_amount)?;
        validate_rate(input.interest_rate)?;

        let terms = DebtTerms {
            total_amount: input.total_amount,
            paid_amount: Decimal::ZERO,
            due_date: input.due_date,
            interest_rate: input.interest_rate,
        };
        let assessment = debt_engine::assess(&terms, Utc::now());

        let txn = self.db.begin().await?;
        super::client::load(&txn, input.owner_id, input.client_id).await?;

        let timestamp = now();
        let debt = debts::ActiveModel {
            id: Set(DebtId::new().into_inner()),
            owner_id: Set(input.owner_id.into_inner()),
            client_id: Set(input.client_id.into_inner()),
            description: Set(input.description),
            total_amount: Set(input.total_amount),
            paid_amount: Set(Decimal::ZERO),
            remaining_amount: Set(assessment.remaining_amount),
            status: Set(assessment.status.into()),
            due_date: Set(to_stored(input.due_date)),
            payment_terms: Set(input.payment_terms),
            interest_rate: Set(input.interest_rate),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        }
        .insert(&txn)
        .await?;

        adjust_client_totals(
            &txn,
            input.owner_id,
            input.client_id,
            input.total_amount,
            Decimal::ZERO,
            "client_total_debt",
        )
        .await?;
        txn.commit().await?;

        info!(
            owner_id = %input.owner_id,
            debt_id = %debt.id,
            client_id = %input.client_id,
            total_amount = %debt.total_amount,
            status = %assessment.status,
            "Debt created"
        );
        Ok(debt)
    }

    /// Updates a debt; a new total moves the client's total debt by the difference.
    ///
    /// # Errors
    ///
    /// Returns `DebtNotFound`, `DebtCancelled`, `TotalBelowPaid`, an amount
    /// validation error, `CascadeFailed`, or a database error.
    pub async fn update_debt(
        &self,
        owner_id: OwnerId,
        debt_id: DebtId,
        input: UpdateDebtInput,
    ) -> Result<debts::Model, LedgerStoreError> {
        validate_rate(input.interest_rate)?;
        let txn = self.db.begin().await?;
        let current = load(&txn, owner_id, debt_id).await?;
        ensure_not_cancelled(&current)?;

        let before = terms_of(&current);
        let total_delta = match input.total_amount {
            Some(total) => debt_engine::total_amount_change(current.id, &before, total)?,
            None => Decimal::ZERO,
        };
        let after = DebtTerms {
            total_amount: before.total_amount + total_delta,
            due_date: input.due_date.unwrap_or(before.due_date),
            interest_rate: input.interest_rate.or(before.interest_rate),
            ..before
        };
        let assessment = debt_engine::assess(&after, Utc::now());
        let client_id = ClientId::from_uuid(current.client_id);

        let mut active: debts::ActiveModel = current.into();
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(terms) = input.payment_terms {
            active.payment_terms = Set(Some(terms));
        }
        active.total_amount = Set(after.total_amount);
        active.due_date = Set(to_stored(after.due_date));
        active.interest_rate = Set(after.interest_rate);
        let updated = write_assessment(&txn, active, &assessment).await?;

        adjust_client_totals(&txn, owner_id, client_id, total_delta, Decimal::ZERO, "client_total_debt")
            .await?;
        txn.commit().await?;

        info!(debt_id = %debt_id, total_delta = %total_delta, status = %assessment.status, "Debt updated");
        Ok(updated)
    }

    /// Settles a debt in full: `paid_amount = total_amount`.
    ///
    /// The settled amount moves from the client's total debt to its total paid.
    ///
    /// # Errors
    ///
    /// Returns `DebtNotFound`, `DebtCancelled`, `CascadeFailed`, or a database error.
    pub async fn mark_paid(&self, owner_id: OwnerId, debt_id: DebtId) -> Result<debts::Model, LedgerStoreError> {
        let txn = self.db.begin().await?;
        let current = load(&txn, owner_id, debt_id).await?;
        let plan = settlement::plan_settlement(debt_id, &terms_of(&current), current.status.into())?;

        let after = DebtTerms {
            paid_amount: plan.paid_amount,
            ..terms_of(&current)
        };
        let assessment = debt_engine::assess(&after, Utc::now());
        let client_id = ClientId::from_uuid(current.client_id);

        let mut active: debts::ActiveModel = current.into();
        active.paid_amount = Set(plan.paid_amount);
        let updated = write_assessment(&txn, active, &assessment).await?;

        adjust_client_totals(
            &txn,
            owner_id,
            client_id,
            -plan.settled_amount,
            plan.settled_amount,
            "client_totals",
        )
        .await?;
        txn.commit().await?;

        info!(debt_id = %debt_id, settled_amount = %plan.settled_amount, "Debt marked paid");
        Ok(updated)
    }

    /// Cancels a debt and removes its remaining amount from the client's total debt.
    ///
    /// # Errors
    ///
    /// Returns `DebtNotFound`, `DebtCancelled`, `CascadeFailed`, or a database error.
    pub async fn cancel_debt(&self, owner_id: OwnerId, debt_id: DebtId) -> Result<debts::Model, LedgerStoreError> {
        let txn = self.db.begin().await?;
        let current = load(&txn, owner_id, debt_id).await?;
        let removed = settlement::plan_cancellation(debt_id, &terms_of(&current), current.status.into())?;
        let client_id = ClientId::from_uuid(current.client_id);

        let mut active: debts::ActiveModel = current.into();
        active.status = Set(DebtStatus::Cancelled);
        active.updated_at = Set(now());
        let updated = active.update(&txn).await?;

        adjust_client_totals(&txn, owner_id, client_id, -removed, Decimal::ZERO, "client_total_debt").await?;
        txn.commit().await?;

        info!(debt_id = %debt_id, removed = %removed, "Debt cancelled");
        Ok(updated)
    }

    /// Sets an explicit status. Only `paid` and `cancelled` can be requested;
    /// every other status is derived.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStatusTransition` for derived statuses, plus the errors
    /// of [`Self::mark_paid`] and [`Self::cancel_debt`].
    pub async fn update_status(
        &self,
        owner_id: OwnerId,
        debt_id: DebtId,
        status: ledger::DebtStatus,
    ) -> Result<debts::Model, LedgerStoreError> {
        match status {
            ledger::DebtStatus::Paid => self.mark_paid(owner_id, debt_id).await,
            ledger::DebtStatus::Cancelled => self.cancel_debt(owner_id, debt_id).await,
            other => {
                let current = load(&self.db, owner_id, debt_id).await?;
                Err(LedgerError::InvalidStatusTransition {
                    entity: "debt",
                    from: ledger::DebtStatus::from(current.status).to_string(),
                    to: other.to_string(),
                }
                .into())
            }
        }
    }

    /// Finds a debt with its assessment at `now`.
    ///
    /// # Errors
    ///
    /// Returns `DebtNotFound` or a database error.
    pub async fn find_debt(
        &self,
        owner_id: OwnerId,
        debt_id: DebtId,
        now: DateTime<Utc>,
    ) -> Result<DebtView, LedgerStoreError> {
        let debt = load(&self.db, owner_id, debt_id).await?;
        Ok(DebtView::at(debt, now))
    }

    /// Lists an owner's debts with their assessments, soonest due first.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_debts(
        &self,
        owner_id: OwnerId,
        client_id: Option<ClientId>,
        now: DateTime<Utc>,
    ) -> Result<Vec<DebtView>, LedgerStoreError> {
        let mut query = debts::Entity::find().filter(debts::Column::OwnerId.eq(owner_id.into_inner()));
        if let Some(client_id) = client_id {
            query = query.filter(debts::Column::ClientId.eq(client_id.into_inner()));
        }
        let debts = query.order_by_asc(debts::Column::DueDate).all(&self.db).await?;
        Ok(debts.into_iter().map(|d| DebtView::at(d, now)).collect())
    }

    /// Re-derives the stored status of every open debt at `now`.
    ///
    /// Returns the number of debts whose status changed.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn refresh_statuses(&self, owner_id: OwnerId, now: DateTime<Utc>) -> Result<u64, LedgerStoreError> {
        let txn = self.db.begin().await?;
        let open = debts::Entity::find()
            .filter(debts::Column::OwnerId.eq(owner_id.into_inner()))
            .filter(debts::Column::Status.is_not_in([DebtStatus::Paid, DebtStatus::Cancelled]))
            .all(&txn)
            .await?;

        let mut changed = 0;
        for debt in open {
            let assessment = debt_engine::assess(&terms_of(&debt), now);
            if DebtStatus::from(assessment.status) == debt.status {
                continue;
            }
            debug!(debt_id = %debt.id, from = ?debt.status, to = %assessment.status, "Debt status refreshed");
            let active: debts::ActiveModel = debt.into();
            write_assessment(&txn, active, &assessment).await?;
            changed += 1;
        }
        txn.commit().await?;

        info!(owner_id = %owner_id, changed, "Debt statuses refreshed");
        Ok(changed)
    }
}

/// Loads an owner's debt for writing or fails with `DebtNotFound`.
pub(crate) async fn load<C: ConnectionTrait>(
    conn: &C,
    owner_id: OwnerId,
    debt_id: DebtId,
) -> Result<debts::Model, LedgerStoreError> {
    for_update(
        debts::Entity::find_by_id(debt_id.into_inner())
            .filter(debts::Column::OwnerId.eq(owner_id.into_inner())),
        conn.get_database_backend(),
    )
    .one(conn)
    .await?
    .ok_or_else(|| LedgerError::DebtNotFound(debt_id.into_inner()).into())
}

/// The engine inputs stored on a debt row.
pub(crate) fn terms_of(debt: &debts::Model) -> DebtTerms {
    DebtTerms {
        total_amount: debt.total_amount,
        paid_amount: debt.paid_amount,
        due_date: to_utc(debt.due_date),
        interest_rate: debt.interest_rate,
    }
}

/// Writes the derived fields and saves the row.
pub(crate) async fn write_assessment<C: ConnectionTrait>(
    conn: &C,
    mut active: debts::ActiveModel,
    assessment: &DebtAssessment,
) -> Result<debts::Model, LedgerStoreError> {
    active.remaining_amount = Set(assessment.remaining_amount);
    active.status = Set(assessment.status.into());
    active.updated_at = Set(now());
    Ok(active.update(conn).await?)
}

fn ensure_not_cancelled(debt: &debts::Model) -> Result<(), LedgerError> {
    if debt.status == DebtStatus::Cancelled {
        return Err(LedgerError::DebtCancelled(debt.id));
    }
    Ok(())
}

fn validate_rate(rate: Option<Decimal>) -> Result<(), LedgerError> {
    match rate {
        Some(r) if r < Decimal::ZERO => Err(LedgerError::NegativeAmount),
        _ => Ok(()),
    }
}
