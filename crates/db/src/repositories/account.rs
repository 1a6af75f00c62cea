//! Account repository: creation, status changes and transfers.
//!
//! Balances are never written directly here except at creation; every later
//! change goes through [`super::balance::apply_delta`].

use bizledger_core::ledger::{self, AccountBalance, LedgerError};
use bizledger_shared::types::{AccountId, OwnerId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::info;

use super::balance::apply_delta;
use super::common::{for_update, now, parse_currency};
use crate::entities::{
    accounts,
    sea_orm_active_enums::{AccountStatus, AccountType},
};
use crate::error::LedgerStoreError;

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Owning tenant.
    pub owner_id: OwnerId,
    /// Display name.
    pub name: String,
    /// Kind of account.
    pub account_type: ledger::AccountType,
    /// Opening balance; also the starting `balance`.
    pub initial_balance: Decimal,
    /// ISO currency code from the allow-list.
    pub currency: String,
}

/// Input for moving money between two accounts of one owner.
#[derive(Debug, Clone, Copy)]
pub struct TransferInput {
    /// Owning tenant.
    pub owner_id: OwnerId,
    /// Source account.
    pub from_account_id: AccountId,
    /// Destination account.
    pub to_account_id: AccountId,
    /// Amount to move.
    pub amount: Decimal,
}

/// Both accounts after a transfer.
#[derive(Debug, Clone, Serialize)]
pub struct TransferResult {
    /// Source account after the debit.
    pub from: accounts::Model,
    /// Destination account after the credit.
    pub to: accounts::Model,
}

/// Account repository.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an account with `balance = initial_balance`.
    ///
    /// # Errors
    ///
    /// Returns `NegativeAmount` for a negative opening balance,
    /// `UnsupportedCurrency`, or a database error.
    pub async fn create_account(
        &self,
        input: CreateAccountInput,
    ) -> Result<accounts::Model, LedgerStoreError> {
        if input.initial_balance < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount.into());
        }
        let currency = parse_currency(&input.currency)?;
        let timestamp = now();

        let account = accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            owner_id: Set(input.owner_id.into_inner()),
            name: Set(input.name),
            account_type: Set(AccountType::from(input.account_type)),
            status: Set(AccountStatus::Active),
            initial_balance: Set(input.initial_balance),
            balance: Set(input.initial_balance),
            currency: Set(currency.code().to_string()),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        }
        .insert(&self.db)
        .await?;

        info!(
            owner_id = %input.owner_id,
            account_id = %account.id,
            initial_balance = %account.initial_balance,
            "Account created"
        );
        Ok(account)
    }

    /// Finds an account by ID.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or a database error.
    pub async fn find_account(
        &self,
        owner_id: OwnerId,
        account_id: AccountId,
    ) -> Result<accounts::Model, LedgerStoreError> {
        load(&self.db, owner_id, account_id).await
    }

    /// Lists an owner's accounts by name.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_accounts(&self, owner_id: OwnerId) -> Result<Vec<accounts::Model>, LedgerStoreError> {
        Ok(accounts::Entity::find()
            .filter(accounts::Column::OwnerId.eq(owner_id.into_inner()))
            .order_by_asc(accounts::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Changes an account's lifecycle status. Accounts are never deleted.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or a database error.
    pub async fn update_status(
        &self,
        owner_id: OwnerId,
        account_id: AccountId,
        status: ledger::AccountStatus,
    ) -> Result<accounts::Model, LedgerStoreError> {
        let account = load(&self.db, owner_id, account_id).await?;
        let mut active: accounts::ActiveModel = account.into();
        active.status = Set(status.into());
        active.updated_at = Set(now());
        let updated = active.update(&self.db).await?;

        info!(account_id = %account_id, status = %status, "Account status changed");
        Ok(updated)
    }

    /// Moves `amount` from one account to another inside one transaction.
    ///
    /// This is the only operation that enforces sufficient funds.
    ///
    /// # Errors
    ///
    /// Returns `SameAccountTransfer`, `AccountNotFound`, an amount validation
    /// error, `InsufficientBalance`, or `CascadeFailed`.
    pub async fn transfer(&self, input: TransferInput) -> Result<TransferResult, LedgerStoreError> {
        let txn = self.db.begin().await?;
        let backend = txn.get_database_backend();

        let source = for_update(
            accounts::Entity::find_by_id(input.from_account_id.into_inner())
                .filter(accounts::Column::OwnerId.eq(input.owner_id.into_inner())),
            backend,
        )
        .one(&txn)
        .await?
        .ok_or(LedgerError::AccountNotFound(input.from_account_id.into_inner()))?;

        let plan = ledger::plan_transfer(
            &AccountBalance {
                account_id: input.from_account_id,
                initial_balance: source.initial_balance,
                balance: source.balance,
            },
            input.to_account_id,
            input.amount,
        )?;

        apply_delta(&txn, input.owner_id, &plan.outgoing, "transfer_out").await?;
        apply_delta(&txn, input.owner_id, &plan.incoming, "transfer_in").await?;

        let from = load(&txn, input.owner_id, input.from_account_id).await?;
        let to = load(&txn, input.owner_id, input.to_account_id).await?;
        txn.commit().await?;

        info!(
            from_account_id = %input.from_account_id,
            to_account_id = %input.to_account_id,
            amount = %input.amount,
            "Transfer committed"
        );
        Ok(TransferResult { from, to })
    }
}

/// Loads an owner's account or fails with `AccountNotFound`.
pub(crate) async fn load<C: ConnectionTrait>(
    conn: &C,
    owner_id: OwnerId,
    account_id: AccountId,
) -> Result<accounts::Model, LedgerStoreError> {
    accounts::Entity::find_by_id(account_id.into_inner())
        .filter(accounts::Column::OwnerId.eq(owner_id.into_inner()))
        .one(conn)
        .await?
        .ok_or_else(|| LedgerError::AccountNotFound(account_id.into_inner()).into())
}
