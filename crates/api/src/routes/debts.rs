//! Debt routes. Reads carry the derived assessment, interest included.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use bizledger_core::ledger::DebtStatus;
use bizledger_db::{
    DebtRepository,
    entities::debts,
    repositories::{CreateDebtInput, DebtView, UpdateDebtInput},
};
use bizledger_shared::types::{ClientId, DebtId, OwnerId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{AppState, error::ApiResult};

/// Creates the debt routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/owners/{owner_id}/debts", get(list_debts).post(create_debt))
        .route("/owners/{owner_id}/debts/refresh", post(refresh_statuses))
        .route("/owners/{owner_id}/debts/{debt_id}", get(get_debt).put(update_debt))
        .route("/owners/{owner_id}/debts/{debt_id}/status", put(update_status))
}

/// Query parameters for listing debts.
#[derive(Debug, Deserialize)]
pub struct ListDebtsQuery {
    /// Only this client's debts.
    pub client_id: Option<Uuid>,
}

/// Request body for creating a debt.
#[derive(Debug, Deserialize)]
pub struct CreateDebtRequest {
    /// Debtor.
    pub client_id: Uuid,
    /// What the debt is for.
    pub description: String,
    /// Amount owed.
    pub total_amount: Decimal,
    /// When payment is due.
    pub due_date: DateTime<Utc>,
    /// Payment terms in days.
    pub payment_terms: Option<i32>,
    /// Monthly interest rate in percent.
    pub interest_rate: Option<Decimal>,
}

/// Request body for updating a debt. Omitted fields stay unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateDebtRequest {
    /// New description.
    pub description: Option<String>,
    /// New total; cannot drop below the paid amount.
    pub total_amount: Option<Decimal>,
    /// New due date.
    pub due_date: Option<DateTime<Utc>>,
    /// New payment terms.
    pub payment_terms: Option<i32>,
    /// New interest rate.
    pub interest_rate: Option<Decimal>,
}

/// Request body for an explicit status change (`paid` or `cancelled`).
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    /// Requested status.
    pub status: DebtStatus,
}

async fn create_debt(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
    Json(payload): Json<CreateDebtRequest>,
) -> ApiResult<(StatusCode, Json<debts::Model>)> {
    let debt = DebtRepository::new(state.conn())
        .create_debt(CreateDebtInput {
            owner_id: OwnerId::from_uuid(owner_id),
            client_id: ClientId::from_uuid(payload.client_id),
            description: payload.description,
            total_amount: payload.total_amount,
            due_date: payload.due_date,
            payment_terms: payload.payment_terms,
            interest_rate: payload.interest_rate,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(debt)))
}

async fn list_debts(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
    Query(query): Query<ListDebtsQuery>,
) -> ApiResult<Json<Value>> {
    let debts = DebtRepository::new(state.conn())
        .list_debts(
            OwnerId::from_uuid(owner_id),
            query.client_id.map(ClientId::from_uuid),
            Utc::now(),
        )
        .await?;
    Ok(Json(json!({ "debts": debts })))
}

async fn get_debt(
    State(state): State<AppState>,
    Path((owner_id, debt_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<DebtView>> {
    let view = DebtRepository::new(state.conn())
        .find_debt(OwnerId::from_uuid(owner_id), DebtId::from_uuid(debt_id), Utc::now())
        .await?;
    Ok(Json(view))
}

async fn update_debt(
    State(state): State<AppState>,
    Path((owner_id, debt_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateDebtRequest>,
) -> ApiResult<Json<debts::Model>> {
    let debt = DebtRepository::new(state.conn())
        .update_debt(
            OwnerId::from_uuid(owner_id),
            DebtId::from_uuid(debt_id),
            UpdateDebtInput {
                description: payload.description,
                total_amount: payload.total_amount,
                due_date: payload.due_date,
                payment_terms: payload.payment_terms,
                interest_rate: payload.interest_rate,
            },
        )
        .await?;
    Ok(Json(debt))
}

async fn update_status(
    State(state): State<AppState>,
    Path((owner_id, debt_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<StatusRequest>,
) -> ApiResult<Json<debts::Model>> {
    let debt = DebtRepository::new(state.conn())
        .update_status(OwnerId::from_uuid(owner_id), DebtId::from_uuid(debt_id), payload.status)
        .await?;
    Ok(Json(debt))
}

/// POST `/owners/{owner_id}/debts/refresh` - Re-derive stored statuses at the current time.
async fn refresh_statuses(State(state): State<AppState>, Path(owner_id): Path<Uuid>) -> ApiResult<Json<Value>> {
    let changed = DebtRepository::new(state.conn())
        .refresh_statuses(OwnerId::from_uuid(owner_id), Utc::now())
        .await?;
    Ok(Json(json!({ "changed": changed })))
}
