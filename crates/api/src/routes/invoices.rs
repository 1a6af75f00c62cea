//! Invoice routes.
//!
//! Reads return the effective status: a sent invoice past its due date reads
//! as `overdue`.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use bizledger_core::ledger::{InvoiceStatus, InvoiceType};
use bizledger_db::{
    InvoiceRepository,
    entities::invoices,
    repositories::{CreateInvoiceInput, InvoiceView, UpdateInvoiceInput},
};
use bizledger_shared::types::{ClientId, InvoiceId, OwnerId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{AppState, error::ApiResult};

/// Creates the invoice routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/owners/{owner_id}/invoices", get(list_invoices).post(create_invoice))
        .route(
            "/owners/{owner_id}/invoices/{invoice_id}",
            get(get_invoice).put(update_invoice).delete(delete_invoice),
        )
        .route("/owners/{owner_id}/invoices/{invoice_id}/status", put(update_status))
}

/// Request body for creating an invoice.
#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    /// Billed client.
    pub client_id: Option<Uuid>,
    /// Human-facing number.
    pub invoice_number: String,
    /// Sent or received.
    #[serde(rename = "type")]
    pub invoice_type: InvoiceType,
    /// Initial status (default: draft).
    pub status: Option<InvoiceStatus>,
    /// Invoice total.
    pub total: Decimal,
    /// ISO currency code (default: the configured currency).
    pub currency: Option<String>,
    /// Issue date.
    pub issue_date: DateTime<Utc>,
    /// Due date.
    pub due_date: DateTime<Utc>,
}

/// Request body for updating invoice fields.
#[derive(Debug, Deserialize)]
pub struct UpdateInvoiceRequest {
    /// New number.
    pub invoice_number: Option<String>,
    /// New client.
    pub client_id: Option<Uuid>,
    /// New total.
    pub total: Option<Decimal>,
    /// New issue date.
    pub issue_date: Option<DateTime<Utc>>,
    /// New due date.
    pub due_date: Option<DateTime<Utc>>,
}

/// Request body for a status change.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    /// Requested status.
    pub status: InvoiceStatus,
}

async fn create_invoice(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
    Json(payload): Json<CreateInvoiceRequest>,
) -> ApiResult<(StatusCode, Json<invoices::Model>)> {
    let invoice = InvoiceRepository::new(state.conn())
        .create_invoice(CreateInvoiceInput {
            owner_id: OwnerId::from_uuid(owner_id),
            client_id: payload.client_id.map(ClientId::from_uuid),
            invoice_number: payload.invoice_number,
            invoice_type: payload.invoice_type,
            status: payload.status.unwrap_or(InvoiceStatus::Draft),
            total: payload.total,
            currency: payload
                .currency
                .unwrap_or_else(|| state.ledger.default_currency.clone()),
            issue_date: payload.issue_date,
            due_date: payload.due_date,
            created_at: None,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

async fn list_invoices(State(state): State<AppState>, Path(owner_id): Path<Uuid>) -> ApiResult<Json<Value>> {
    let invoices = InvoiceRepository::new(state.conn())
        .list_invoices(OwnerId::from_uuid(owner_id), Utc::now())
        .await?;
    Ok(Json(json!({ "invoices": invoices })))
}

async fn get_invoice(
    State(state): State<AppState>,
    Path((owner_id, invoice_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<InvoiceView>> {
    let view = InvoiceRepository::new(state.conn())
        .find_invoice(OwnerId::from_uuid(owner_id), InvoiceId::from_uuid(invoice_id), Utc::now())
        .await?;
    Ok(Json(view))
}

async fn update_invoice(
    State(state): State<AppState>,
    Path((owner_id, invoice_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateInvoiceRequest>,
) -> ApiResult<Json<invoices::Model>> {
    let invoice = InvoiceRepository::new(state.conn())
        .update_invoice(
            OwnerId::from_uuid(owner_id),
            InvoiceId::from_uuid(invoice_id),
            UpdateInvoiceInput {
                invoice_number: payload.invoice_number,
                client_id: payload.client_id.map(ClientId::from_uuid),
                total: payload.total,
                issue_date: payload.issue_date,
                due_date: payload.due_date,
            },
        )
        .await?;
    Ok(Json(invoice))
}

async fn update_status(
    State(state): State<AppState>,
    Path((owner_id, invoice_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<StatusRequest>,
) -> ApiResult<Json<invoices::Model>> {
    let invoice = InvoiceRepository::new(state.conn())
        .update_status(
            OwnerId::from_uuid(owner_id),
            InvoiceId::from_uuid(invoice_id),
            payload.status,
        )
        .await?;
    Ok(Json(invoice))
}

async fn delete_invoice(
    State(state): State<AppState>,
    Path((owner_id, invoice_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    InvoiceRepository::new(state.conn())
        .delete_invoice(OwnerId::from_uuid(owner_id), InvoiceId::from_uuid(invoice_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
