//! Payment routes. Every write runs the payment cascade.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use bizledger_core::ledger::{PaymentMethod, PaymentStatus, PaymentType};
use bizledger_db::{
    PaymentRepository,
    entities::payments,
    repositories::{CreatePaymentInput, UpdatePaymentInput},
};
use bizledger_shared::types::{AccountId, InvoiceId, OwnerId, PaymentId};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{AppState, error::ApiResult};

/// Creates the payment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/owners/{owner_id}/payments", get(list_payments).post(create_payment))
        .route(
            "/owners/{owner_id}/payments/{payment_id}",
            get(get_payment).put(update_payment).delete(delete_payment),
        )
}

/// Request body for recording a payment.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    /// Income or expense.
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    /// How the money moved.
    pub method: PaymentMethod,
    /// Initial status (default: completed).
    pub status: Option<PaymentStatus>,
    /// Unsigned amount.
    pub amount: Decimal,
    /// Free text.
    pub description: Option<String>,
    /// Account whose balance moves.
    pub account_id: Option<Uuid>,
    /// Invoice this payment settles.
    pub invoice_id: Option<Uuid>,
}

/// Request body for updating a payment. Omitted fields stay unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdatePaymentRequest {
    /// New direction.
    #[serde(rename = "type")]
    pub payment_type: Option<PaymentType>,
    /// New method.
    pub method: Option<PaymentMethod>,
    /// New status.
    pub status: Option<PaymentStatus>,
    /// New amount.
    pub amount: Option<Decimal>,
    /// New description.
    pub description: Option<String>,
    /// New account.
    pub account_id: Option<Uuid>,
    /// New invoice.
    pub invoice_id: Option<Uuid>,
}

async fn create_payment(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
    Json(payload): Json<CreatePaymentRequest>,
) -> ApiResult<(StatusCode, Json<payments::Model>)> {
    let payment = PaymentRepository::new(state.conn())
        .create_payment(CreatePaymentInput {
            owner_id: OwnerId::from_uuid(owner_id),
            payment_type: payload.payment_type,
            method: payload.method,
            status: payload.status.unwrap_or(PaymentStatus::Completed),
            amount: payload.amount,
            description: payload.description,
            account_id: payload.account_id.map(AccountId::from_uuid),
            invoice_id: payload.invoice_id.map(InvoiceId::from_uuid),
            created_at: None,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

async fn list_payments(State(state): State<AppState>, Path(owner_id): Path<Uuid>) -> ApiResult<Json<Value>> {
    let payments = PaymentRepository::new(state.conn())
        .list_payments(OwnerId::from_uuid(owner_id))
        .await?;
    Ok(Json(json!({ "payments": payments })))
}

async fn get_payment(
    State(state): State<AppState>,
    Path((owner_id, payment_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<payments::Model>> {
    let payment = PaymentRepository::new(state.conn())
        .find_payment(OwnerId::from_uuid(owner_id), PaymentId::from_uuid(payment_id))
        .await?;
    Ok(Json(payment))
}

async fn update_payment(
    State(state): State<AppState>,
    Path((owner_id, payment_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdatePaymentRequest>,
) -> ApiResult<Json<payments::Model>> {
    let payment = PaymentRepository::new(state.conn())
        .update_payment(
            OwnerId::from_uuid(owner_id),
            PaymentId::from_uuid(payment_id),
            UpdatePaymentInput {
                payment_type: payload.payment_type,
                method: payload.method,
                status: payload.status,
                amount: payload.amount,
                description: payload.description,
                account_id: payload.account_id.map(AccountId::from_uuid),
                invoice_id: payload.invoice_id.map(InvoiceId::from_uuid),
            },
        )
        .await?;
    Ok(Json(payment))
}

async fn delete_payment(
    State(state): State<AppState>,
    Path((owner_id, payment_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    PaymentRepository::new(state.conn())
        .delete_payment(OwnerId::from_uuid(owner_id), PaymentId::from_uuid(payment_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
