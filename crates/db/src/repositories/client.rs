//! Client repository.

use bizledger_core::ledger::LedgerError;
use bizledger_shared::types::{ClientId, OwnerId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use tracing::{info, warn};

use super::common::{for_update, now};
use crate::entities::{clients, debts, sea_orm_active_enums::DebtStatus};
use crate::error::LedgerStoreError;

/// Input for creating a client.
#[derive(Debug, Clone)]
pub struct CreateClientInput {
    /// Owning tenant.
    pub owner_id: OwnerId,
    /// Client name.
    pub name: String,
    /// Contact email.
    pub email: Option<String>,
    /// Credit limit.
    pub credit_limit: Decimal,
    /// Default payment terms in days.
    pub payment_terms: i32,
}

/// Client repository.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    db: DatabaseConnection,
}

impl ClientRepository {
    /// Creates a new client repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a client with zero totals.
    ///
    /// # Errors
    ///
    /// Returns `NegativeAmount` for a negative credit limit, or a database error.
    pub async fn create_client(&self, input: CreateClientInput) -> Result<clients::Model, LedgerStoreError> {
        if input.credit_limit < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount.into());
        }
        let timestamp = now();

        let client = clients::ActiveModel {
            id: Set(ClientId::new().into_inner()),
            owner_id: Set(input.owner_id.into_inner()),
            name: Set(input.name),
            email: Set(input.email),
            credit_limit: Set(input.credit_limit),
            payment_terms: Set(input.payment_terms),
            total_debt: Set(Decimal::ZERO),
            total_paid: Set(Decimal::ZERO),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        }
        .insert(&self.db)
        .await?;

        info!(owner_id = %input.owner_id, client_id = %client.id, "Client created");
        Ok(client)
    }

    /// Finds a client by ID.
    ///
    /// # Errors
    ///
    /// Returns `ClientNotFound` or a database error.
    pub async fn find_client(
        &self,
        owner_id: OwnerId,
        client_id: ClientId,
    ) -> Result<clients::Model, LedgerStoreError> {
        load(&self.db, owner_id, client_id).await
    }

    /// Recomputes a client's totals from its debts and writes them back.
    ///
    /// `total_debt` is the remaining amount of every non-cancelled debt and
    /// `total_paid` the paid amount of every debt.
    ///
    /// # Errors
    ///
    /// Returns `ClientNotFound` or a database error.
    pub async fn reconcile_totals(
        &self,
        owner_id: OwnerId,
        client_id: ClientId,
    ) -> Result<clients::Model, LedgerStoreError> {
        let txn = self.db.begin().await?;
        let backend = txn.get_database_backend();

        let client = for_update(
            clients::Entity::find_by_id(client_id.into_inner())
                .filter(clients::Column::OwnerId.eq(owner_id.into_inner())),
            backend,
        )
        .one(&txn)
        .await?
        .ok_or(LedgerError::ClientNotFound(client_id.into_inner()))?;

        let client_debts = debts::Entity::find()
            .filter(debts::Column::ClientId.eq(client_id.into_inner()))
            .filter(debts::Column::OwnerId.eq(owner_id.into_inner()))
            .all(&txn)
            .await?;

        let (total_debt, total_paid) = client_debts.iter().fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(debt, paid), d| {
                let remaining = if d.status == DebtStatus::Cancelled {
                    Decimal::ZERO
                } else {
                    d.total_amount - d.paid_amount
                };
                (debt + remaining, paid + d.paid_amount)
            },
        );

        if client.total_debt != total_debt || client.total_paid != total_paid {
            warn!(
                client_id = %client_id,
                stored_total_debt = %client.total_debt,
                stored_total_paid = %client.total_paid,
                total_debt = %total_debt,
                total_paid = %total_paid,
                "Client totals drifted, rewriting"
            );
        }

        let mut active: clients::ActiveModel = client.into();
        active.total_debt = Set(total_debt);
        active.total_paid = Set(total_paid);
        active.updated_at = Set(now());
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        Ok(updated)
    }
}

/// Loads an owner's client or fails with `ClientNotFound`.
pub(crate) async fn load<C: ConnectionTrait>(
    conn: &C,
    owner_id: OwnerId,
    client_id: ClientId,
) -> Result<clients::Model, LedgerStoreError> {
    clients::Entity::find_by_id(client_id.into_inner())
        .filter(clients::Column::OwnerId.eq(owner_id.into_inner()))
        .one(conn)
        .await?
        .ok_or_else(|| LedgerError::ClientNotFound(client_id.into_inner()).into())
}
