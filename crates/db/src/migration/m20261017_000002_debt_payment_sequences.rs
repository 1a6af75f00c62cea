//! Per-owner counter for debt-payment numbers.
//!
//! Numbers are reserved by bumping one counter row per owner, so concurrent
//! creates queue on that row instead of racing on a count. Existing owners
//! start from the number of debt payments they already have.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DebtPaymentSequences::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DebtPaymentSequences::OwnerId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DebtPaymentSequences::LastValue)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(BACKFILL_SQL)
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DebtPaymentSequences::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}

const BACKFILL_SQL: &str = r"
INSERT INTO debt_payment_sequences (owner_id, last_value)
SELECT owner_id, COUNT(*) FROM debt_payments GROUP BY owner_id;
";

#[derive(DeriveIden)]
enum DebtPaymentSequences {
    Table,
    OwnerId,
    LastValue,
}
