//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration and run on both Postgres and SQLite.

pub use sea_orm_migration::prelude::*;

mod m20261016_000001_ledger_schema;
mod m20261017_000002_debt_payment_sequences;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261016_000001_ledger_schema::Migration),
            Box::new(m20261017_000002_debt_payment_sequences::Migration),
        ]
    }
}
