//! Account routes: create, read, status changes and transfers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use bizledger_core::ledger::{AccountStatus, AccountType};
use bizledger_db::{
    AccountRepository,
    entities::accounts,
    repositories::{CreateAccountInput, TransferInput, TransferResult},
};
use bizledger_shared::types::{AccountId, OwnerId};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{AppState, error::ApiResult};

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/owners/{owner_id}/accounts", get(list_accounts).post(create_account))
        .route("/owners/{owner_id}/accounts/{account_id}", get(get_account))
        .route("/owners/{owner_id}/accounts/{account_id}/status", put(update_status))
        .route("/owners/{owner_id}/transfers", post(transfer))
}

/// Request body for creating an account.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Display name.
    pub name: String,
    /// Account kind.
    #[serde(rename = "type")]
    pub account_type: AccountType,
    /// Opening balance (default: 0).
    pub initial_balance: Option<Decimal>,
    /// ISO currency code (default: the configured currency).
    pub currency: Option<String>,
}

/// Request body for a status change.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    /// New status.
    pub status: AccountStatus,
}

/// Request body for a transfer.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    /// Source account.
    pub from_account_id: Uuid,
    /// Destination account.
    pub to_account_id: Uuid,
    /// Amount to move.
    pub amount: Decimal,
}

/// POST `/owners/{owner_id}/accounts`
async fn create_account(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
    Json(payload): Json<CreateAccountRequest>,
) -> ApiResult<(StatusCode, Json<accounts::Model>)> {
    let account = AccountRepository::new(state.conn())
        .create_account(CreateAccountInput {
            owner_id: OwnerId::from_uuid(owner_id),
            name: payload.name,
            account_type: payload.account_type,
            initial_balance: payload.initial_balance.unwrap_or(Decimal::ZERO),
            currency: payload
                .currency
                .unwrap_or_else(|| state.ledger.default_currency.clone()),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// GET `/owners/{owner_id}/accounts`
async fn list_accounts(State(state): State<AppState>, Path(owner_id): Path<Uuid>) -> ApiResult<Json<Value>> {
    let accounts = AccountRepository::new(state.conn())
        .list_accounts(OwnerId::from_uuid(owner_id))
        .await?;
    Ok(Json(json!({ "accounts": accounts })))
}

/// GET `/owners/{owner_id}/accounts/{account_id}`
async fn get_account(
    State(state): State<AppState>,
    Path((owner_id, account_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<accounts::Model>> {
    let account = AccountRepository::new(state.conn())
        .find_account(OwnerId::from_uuid(owner_id), AccountId::from_uuid(account_id))
        .await?;
    Ok(Json(account))
}

/// PUT `/owners/{owner_id}/accounts/{account_id}/status`
async fn update_status(
    State(state): State<AppState>,
    Path((owner_id, account_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<StatusRequest>,
) -> ApiResult<Json<accounts::Model>> {
    let account = AccountRepository::new(state.conn())
        .update_status(
            OwnerId::from_uuid(owner_id),
            AccountId::from_uuid(account_id),
            payload.status,
        )
        .await?;
    Ok(Json(account))
}

/// POST `/owners/{owner_id}/transfers`
async fn transfer(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
    Json(payload): Json<TransferRequest>,
) -> ApiResult<Json<TransferResult>> {
    let result = AccountRepository::new(state.conn())
        .transfer(TransferInput {
            owner_id: OwnerId::from_uuid(owner_id),
            from_account_id: AccountId::from_uuid(payload.from_account_id),
            to_account_id: AccountId::from_uuid(payload.to_account_id),
            amount: payload.amount,
        })
        .await?;
    Ok(Json(result))
}
