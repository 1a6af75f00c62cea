//! Shared fixtures for repository integration tests.
//!
//! Every test gets its own in-memory SQLite database with the ledger schema
//! applied. The pool holds exactly one connection so the database lives as
//! long as the returned handle.

#![allow(dead_code)]

use bizledger_core::ledger::{AccountType, PaymentMethod, PaymentStatus, PaymentType};
use bizledger_db::{
    AccountRepository, ClientRepository,
    entities::{accounts, clients},
    migration::{Migrator, MigratorTrait},
    repositories::{
        account::CreateAccountInput, client::CreateClientInput, payment::CreatePaymentInput,
    },
};
use bizledger_shared::types::{AccountId, OwnerId};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

pub async fn setup() -> DatabaseConnection {
    let db = bizledger_db::connect_with_pool("sqlite::memory:", 1, 1)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

pub async fn create_account(
    db: &DatabaseConnection,
    owner_id: OwnerId,
    initial_balance: Decimal,
) -> accounts::Model {
    AccountRepository::new(db.clone())
        .create_account(CreateAccountInput {
            owner_id,
            name: "Operating".to_string(),
            account_type: AccountType::Bank,
            initial_balance,
            currency: "USD".to_string(),
        })
        .await
        .expect("Failed to create account")
}

pub async fn create_client(db: &DatabaseConnection, owner_id: OwnerId) -> clients::Model {
    ClientRepository::new(db.clone())
        .create_client(CreateClientInput {
            owner_id,
            name: "Acme Corp".to_string(),
            email: Some("billing@acme.test".to_string()),
            credit_limit: Decimal::from(10_000),
            payment_terms: 30,
        })
        .await
        .expect("Failed to create client")
}

pub async fn balance_of(db: &DatabaseConnection, owner_id: OwnerId, account_id: AccountId) -> Decimal {
    AccountRepository::new(db.clone())
        .find_account(owner_id, account_id)
        .await
        .expect("Account should exist")
        .balance
}

/// A completed payment recorded now.
pub fn completed_payment(
    owner_id: OwnerId,
    account_id: AccountId,
    payment_type: PaymentType,
    amount: Decimal,
) -> CreatePaymentInput {
    CreatePaymentInput {
        owner_id,
        payment_type,
        method: PaymentMethod::BankTransfer,
        status: PaymentStatus::Completed,
        amount,
        description: None,
        account_id: Some(account_id),
        invoice_id: None,
        created_at: None,
    }
}

/// Midday on the given date, UTC.
pub fn on(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .expect("valid date")
}
