//! Client routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use bizledger_db::{ClientRepository, entities::clients, repositories::CreateClientInput};
use bizledger_shared::types::{ClientId, OwnerId};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiResult};

const DEFAULT_PAYMENT_TERMS: i32 = 30;

/// Creates the client routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/owners/{owner_id}/clients", post(create_client))
        .route("/owners/{owner_id}/clients/{client_id}", get(get_client))
        .route("/owners/{owner_id}/clients/{client_id}/reconcile", post(reconcile))
}

/// Request body for creating a client.
#[derive(Debug, Deserialize)]
pub struct CreateClientRequest {
    /// Client name.
    pub name: String,
    /// Contact email.
    pub email: Option<String>,
    /// Credit limit (default: 0).
    pub credit_limit: Option<Decimal>,
    /// Payment terms in days (default: 30).
    pub payment_terms: Option<i32>,
}

async fn create_client(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
    Json(payload): Json<CreateClientRequest>,
) -> ApiResult<(StatusCode, Json<clients::Model>)> {
    let client = ClientRepository::new(state.conn())
        .create_client(CreateClientInput {
            owner_id: OwnerId::from_uuid(owner_id),
            name: payload.name,
            email: payload.email,
            credit_limit: payload.credit_limit.unwrap_or(Decimal::ZERO),
            payment_terms: payload.payment_terms.unwrap_or(DEFAULT_PAYMENT_TERMS),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(client)))
}

async fn get_client(
    State(state): State<AppState>,
    Path((owner_id, client_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<clients::Model>> {
    let client = ClientRepository::new(state.conn())
        .find_client(OwnerId::from_uuid(owner_id), ClientId::from_uuid(client_id))
        .await?;
    Ok(Json(client))
}

/// POST `/owners/{owner_id}/clients/{client_id}/reconcile` - Recompute totals from debts.
async fn reconcile(
    State(state): State<AppState>,
    Path((owner_id, client_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<clients::Model>> {
    let client = ClientRepository::new(state.conn())
        .reconcile_totals(OwnerId::from_uuid(owner_id), ClientId::from_uuid(client_id))
        .await?;
    Ok(Json(client))
}
