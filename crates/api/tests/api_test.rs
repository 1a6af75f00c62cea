//! End-to-end tests that drive the router over an in-memory database.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::CONTENT_TYPE},
};
use bizledger_api::{AppState, create_router};
use bizledger_db::migration::{Migrator, MigratorTrait};
use bizledger_shared::LedgerConfig;
use chrono::{Datelike, Duration, Utc};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

async fn app() -> Router {
    let db = bizledger_db::connect_with_pool("sqlite::memory:", 1, 1)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    create_router(AppState::new(db, LedgerConfig::default()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}

fn amount(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = app().await;

    let (status, body) = send(&app, "GET", "/api/v1/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_account_defaults_to_configured_currency() {
    let app = app().await;
    let owner = Uuid::now_v7();

    let (status, account) = send(
        &app,
        "POST",
        &format!("/api/v1/owners/{owner}/accounts"),
        Some(json!({ "name": "Till", "type": "cash", "initial_balance": "25" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(account["currency"], "USD");
    assert_eq!(account["account_type"], "cash");
    assert_eq!(account["status"], "active");
}

#[tokio::test]
async fn test_payment_flow_moves_balance() {
    let app = app().await;
    let owner = Uuid::now_v7();

    let (_, account) = send(
        &app,
        "POST",
        &format!("/api/v1/owners/{owner}/accounts"),
        Some(json!({ "name": "Operating", "type": "bank", "initial_balance": "500" })),
    )
    .await;
    let account_id = id_of(&account);

    let (status, payment) = send(
        &app,
        "POST",
        &format!("/api/v1/owners/{owner}/payments"),
        Some(json!({
            "type": "income",
            "method": "bank_transfer",
            "amount": "200",
            "account_id": account_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, account) = send(&app, "GET", &format!("/api/v1/owners/{owner}/accounts/{account_id}"), None).await;
    assert_eq!(amount(&account["balance"]), dec!(700));

    let payment_id = id_of(&payment);
    let (status, _) = send(&app, "DELETE", &format!("/api/v1/owners/{owner}/payments/{payment_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, account) = send(&app, "GET", &format!("/api/v1/owners/{owner}/accounts/{account_id}"), None).await;
    assert_eq!(amount(&account["balance"]), dec!(500));
}

#[tokio::test]
async fn test_unknown_account_is_404_with_code() {
    let app = app().await;
    let owner = Uuid::now_v7();

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/owners/{owner}/accounts/{}", Uuid::now_v7()),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "ACCOUNT_NOT_FOUND");
}

#[tokio::test]
async fn test_zero_amount_is_400() {
    let app = app().await;
    let owner = Uuid::now_v7();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/owners/{owner}/payments"),
        Some(json!({ "type": "expense", "method": "cash", "amount": "0" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ZERO_AMOUNT");
}

#[tokio::test]
async fn test_closed_month_rejects_payments_with_423() {
    let app = app().await;
    let owner = Uuid::now_v7();
    let now = Utc::now();

    let (status, closed) = send(
        &app,
        "POST",
        &format!("/api/v1/owners/{owner}/periods/{}/{}/close", now.year(), now.month()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["period"]["status"], "closed");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/owners/{owner}/payments"),
        Some(json!({ "type": "income", "method": "cash", "amount": "10" })),
    )
    .await;

    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(body["error"], "PERIOD_CLOSED");
}

#[tokio::test]
async fn test_debt_payment_completion_updates_debt_view() {
    let app = app().await;
    let owner = Uuid::now_v7();

    let (_, account) = send(
        &app,
        "POST",
        &format!("/api/v1/owners/{owner}/accounts"),
        Some(json!({ "name": "Operating", "type": "bank" })),
    )
    .await;
    let (_, client) = send(
        &app,
        "POST",
        &format!("/api/v1/owners/{owner}/clients"),
        Some(json!({ "name": "Acme Corp" })),
    )
    .await;
    let (status, debt) = send(
        &app,
        "POST",
        &format!("/api/v1/owners/{owner}/debts"),
        Some(json!({
            "client_id": id_of(&client),
            "description": "Consulting",
            "total_amount": "1000",
            "due_date": (Utc::now() + Duration::days(30)).to_rfc3339(),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let debt_id = id_of(&debt);

    let (status, record) = send(
        &app,
        "POST",
        &format!("/api/v1/owners/{owner}/debts/{debt_id}/payments"),
        Some(json!({ "account_id": id_of(&account), "amount": "300", "method": "cash" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["status"], "pending");
    assert_eq!(record["payment_number"], "DP-000001");

    let record_id = id_of(&record);
    let (status, record) = send(
        &app,
        "POST",
        &format!("/api/v1/owners/{owner}/debt-payments/{record_id}/complete"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["status"], "completed");

    let (_, view) = send(&app, "GET", &format!("/api/v1/owners/{owner}/debts/{debt_id}"), None).await;
    assert_eq!(view["assessment"]["status"], "partial");
    assert_eq!(amount(&view["assessment"]["remaining_amount"]), dec!(700));

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/owners/{owner}/debt-payments/{record_id}/status"),
        Some(json!({ "status": "pending" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_STATUS_TRANSITION");
}
