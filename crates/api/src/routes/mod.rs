//! API route definitions.
//!
//! Every ledger route is scoped by owner: `/owners/{owner_id}/...`.

use axum::Router;

use crate::AppState;

pub mod accounts;
pub mod clients;
pub mod debt_payments;
pub mod debts;
pub mod health;
pub mod invoices;
pub mod payments;
pub mod periods;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(accounts::routes())
        .merge(clients::routes())
        .merge(invoices::routes())
        .merge(payments::routes())
        .merge(debts::routes())
        .merge(debt_payments::routes())
        .merge(periods::routes())
}
