//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST routes over the ledger repositories, scoped by owner
//! - JSON error rendering for ledger failures

pub mod error;
pub mod routes;

use axum::Router;
use bizledger_shared::LedgerConfig;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Ledger behaviour (lock scope, default currency).
    pub ledger: LedgerConfig,
}

impl AppState {
    /// Creates the state from a connection and ledger settings.
    #[must_use]
    pub fn new(db: DatabaseConnection, ledger: LedgerConfig) -> Self {
        Self {
            db: Arc::new(db),
            ledger,
        }
    }

    /// Clones the pool handle for a repository.
    pub(crate) fn conn(&self) -> DatabaseConnection {
        (*self.db).clone()
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
