//! JSON error responses.
//!
//! Every failure renders as `{ "error": CODE, "message": text }` with the
//! status the ledger assigns to it.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bizledger_core::ledger::LedgerError;
use bizledger_db::LedgerStoreError;
use serde_json::json;
use tracing::{error, warn};

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// A ledger failure on its way to the client.
#[derive(Debug)]
pub struct ApiError(LedgerStoreError);

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<LedgerStoreError> for ApiError {
    fn from(err: LedgerStoreError) -> Self {
        Self(err)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Raw driver errors stay in the logs.
        let message = match &self.0 {
            LedgerStoreError::Database(_) => "An error occurred".to_string(),
            LedgerStoreError::Ledger(e) => e.to_string(),
        };

        if status.is_server_error() {
            error!(error = %self.0, code = self.0.error_code(), "Request failed");
        } else {
            warn!(error = %self.0, code = self.0.error_code(), "Request rejected");
        }

        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": message
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rstest::rstest;
    use sea_orm::DbErr;
    use uuid::Uuid;

    #[rstest]
    #[case(LedgerError::ZeroAmount, StatusCode::BAD_REQUEST)]
    #[case(LedgerError::DebtNotFound(Uuid::nil()), StatusCode::NOT_FOUND)]
    #[case(LedgerError::PaymentLocked(Uuid::nil()), StatusCode::LOCKED)]
    #[case(
        LedgerError::CascadeFailed { step: "account_balance", message: "gone".into() },
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    fn test_status_follows_ledger_error(#[case] err: LedgerError, #[case] expected: StatusCode) {
        assert_eq!(ApiError::from(err).status(), expected);
    }

    #[tokio::test]
    async fn test_body_carries_code_and_message() {
        let response = ApiError::from(LedgerError::PeriodClosed { year: 2024, month: 3 }).into_response();
        assert_eq!(response.status(), StatusCode::LOCKED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "PERIOD_CLOSED");
        assert_eq!(json["message"], "Financial period 2024-03 is closed");
    }

    #[tokio::test]
    async fn test_database_error_hides_driver_message() {
        let response =
            ApiError::from(LedgerStoreError::Database(DbErr::Custom("password=hunter2".into()))).into_response();

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "DATABASE_ERROR");
        assert_eq!(json["message"], "An error occurred");
    }
}
