//! Financial period routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use bizledger_db::{PeriodRepository, entities::financial_periods, repositories::ClosedPeriod};
use bizledger_shared::types::OwnerId;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{AppState, error::ApiResult};

/// Creates the period routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/owners/{owner_id}/periods", get(list_periods))
        .route("/owners/{owner_id}/periods/{year}/{month}", get(get_period))
        .route("/owners/{owner_id}/periods/{year}/{month}/close", post(close_period))
}

fn repository(state: &AppState) -> PeriodRepository {
    PeriodRepository::new(state.conn(), state.ledger.period_lock_scope)
}

/// POST `/owners/{owner_id}/periods/{year}/{month}/close` - Compute totals and lock the month.
async fn close_period(
    State(state): State<AppState>,
    Path((owner_id, year, month)): Path<(Uuid, i32, u32)>,
) -> ApiResult<Json<ClosedPeriod>> {
    let closed = repository(&state)
        .close_period(OwnerId::from_uuid(owner_id), year, month)
        .await?;
    Ok(Json(closed))
}

async fn get_period(
    State(state): State<AppState>,
    Path((owner_id, year, month)): Path<(Uuid, i32, u32)>,
) -> ApiResult<Json<financial_periods::Model>> {
    let period = repository(&state)
        .find_period(OwnerId::from_uuid(owner_id), year, month)
        .await?;
    Ok(Json(period))
}

async fn list_periods(State(state): State<AppState>, Path(owner_id): Path<Uuid>) -> ApiResult<Json<Value>> {
    let periods = repository(&state).list_periods(OwnerId::from_uuid(owner_id)).await?;
    Ok(Json(json!({ "periods": periods })))
}
