//! Debt-payment routes. Completion runs the debt-payment cascade.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use bizledger_core::ledger::{PaymentMethod, PaymentStatus};
use bizledger_db::{
    DebtPaymentRepository, entities::debt_payments, repositories::CreateDebtPaymentInput,
};
use bizledger_shared::types::{AccountId, DebtId, DebtPaymentId, OwnerId};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{AppState, error::ApiResult};

/// Creates the debt-payment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/owners/{owner_id}/debts/{debt_id}/payments",
            get(list_for_debt).post(create_debt_payment),
        )
        .route("/owners/{owner_id}/debt-payments/{debt_payment_id}/status", put(update_status))
        .route("/owners/{owner_id}/debt-payments/{debt_payment_id}/complete", post(complete))
}

/// Request body for recording a debt payment.
#[derive(Debug, Deserialize)]
pub struct CreateDebtPaymentRequest {
    /// Account receiving the money.
    pub account_id: Uuid,
    /// Amount paid; cannot exceed the remaining amount.
    pub amount: Decimal,
    /// How the money moved.
    pub method: PaymentMethod,
    /// Initial status (default: pending).
    pub status: Option<PaymentStatus>,
    /// Free text.
    pub notes: Option<String>,
}

/// Request body for a status change.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    /// Requested status.
    pub status: PaymentStatus,
}

async fn create_debt_payment(
    State(state): State<AppState>,
    Path((owner_id, debt_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<CreateDebtPaymentRequest>,
) -> ApiResult<(StatusCode, Json<debt_payments::Model>)> {
    let record = DebtPaymentRepository::new(state.conn())
        .create_debt_payment(CreateDebtPaymentInput {
            owner_id: OwnerId::from_uuid(owner_id),
            debt_id: DebtId::from_uuid(debt_id),
            account_id: AccountId::from_uuid(payload.account_id),
            amount: payload.amount,
            method: payload.method,
            status: payload.status.unwrap_or(PaymentStatus::Pending),
            notes: payload.notes,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_for_debt(
    State(state): State<AppState>,
    Path((owner_id, debt_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Value>> {
    let records = DebtPaymentRepository::new(state.conn())
        .list_for_debt(OwnerId::from_uuid(owner_id), DebtId::from_uuid(debt_id))
        .await?;
    Ok(Json(json!({ "debt_payments": records })))
}

async fn update_status(
    State(state): State<AppState>,
    Path((owner_id, debt_payment_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<StatusRequest>,
) -> ApiResult<Json<debt_payments::Model>> {
    let record = DebtPaymentRepository::new(state.conn())
        .update_status(
            OwnerId::from_uuid(owner_id),
            DebtPaymentId::from_uuid(debt_payment_id),
            payload.status,
        )
        .await?;
    Ok(Json(record))
}

async fn complete(
    State(state): State<AppState>,
    Path((owner_id, debt_payment_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<debt_payments::Model>> {
    let record = DebtPaymentRepository::new(state.conn())
        .complete(OwnerId::from_uuid(owner_id), DebtPaymentId::from_uuid(debt_payment_id))
        .await?;
    Ok(Json(record))
}
