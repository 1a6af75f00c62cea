//! Persistence side of the balance mutation protocol.
//!
//! Account balances and client totals are only ever changed with in-place
//! increments (`balance = balance + $delta`), so concurrent cascades add up
//! instead of overwriting each other.

use bizledger_core::ledger::{BalanceDelta, LedgerError};
use bizledger_shared::types::{ClientId, OwnerId};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use tracing::debug;

use super::common::now;
use crate::entities::{accounts, clients};
use crate::error::{CascadeStep, LedgerStoreError};

/// Applies one delta to an account owned by `owner_id`.
///
/// # Errors
///
/// Returns `AccountNotFound` if no such account exists, or `CascadeFailed`
/// naming `step` if the write fails.
pub(crate) async fn apply_delta<C: ConnectionTrait>(
    conn: &C,
    owner_id: OwnerId,
    delta: &BalanceDelta,
    step: &'static str,
) -> Result<(), LedgerStoreError> {
    let account_id = delta.account_id.into_inner();
    let result = accounts::Entity::update_many()
        .col_expr(
            accounts::Column::Balance,
            Expr::col(accounts::Column::Balance).add(delta.signed_amount()),
        )
        .col_expr(accounts::Column::UpdatedAt, Expr::value(now()))
        .filter(accounts::Column::Id.eq(account_id))
        .filter(accounts::Column::OwnerId.eq(owner_id.into_inner()))
        .exec(conn)
        .await
        .in_step(step)?;

    if result.rows_affected == 0 {
        return Err(LedgerError::AccountNotFound(account_id).into());
    }

    debug!(
        account_id = %account_id,
        delta = %delta.signed_amount(),
        step,
        "Balance delta applied"
    );
    Ok(())
}

/// Adds to a client's running totals.
///
/// # Errors
///
/// Returns `ClientNotFound` if no such client exists, or `CascadeFailed`
/// naming `step` if the write fails.
pub(crate) async fn adjust_client_totals<C: ConnectionTrait>(
    conn: &C,
    owner_id: OwnerId,
    client_id: ClientId,
    total_debt_delta: Decimal,
    total_paid_delta: Decimal,
    step: &'static str,
) -> Result<(), LedgerStoreError> {
    if total_debt_delta.is_zero() && total_paid_delta.is_zero() {
        return Ok(());
    }

    let result = clients::Entity::update_many()
        .col_expr(
            clients::Column::TotalDebt,
            Expr::col(clients::Column::TotalDebt).add(total_debt_delta),
        )
        .col_expr(
            clients::Column::TotalPaid,
            Expr::col(clients::Column::TotalPaid).add(total_paid_delta),
        )
        .col_expr(clients::Column::UpdatedAt, Expr::value(now()))
        .filter(clients::Column::Id.eq(client_id.into_inner()))
        .filter(clients::Column::OwnerId.eq(owner_id.into_inner()))
        .exec(conn)
        .await
        .in_step(step)?;

    if result.rows_affected == 0 {
        return Err(LedgerError::ClientNotFound(client_id.into_inner()).into());
    }

    debug!(
        client_id = %client_id,
        total_debt_delta = %total_debt_delta,
        total_paid_delta = %total_paid_delta,
        step,
        "Client totals adjusted"
    );
    Ok(())
}
