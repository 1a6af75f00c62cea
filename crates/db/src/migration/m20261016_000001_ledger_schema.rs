//! Ledger schema: accounts, clients, invoices, payments, debts, debt payments
//! and financial periods.
//!
//! Money is `NUMERIC(19,4)` on Postgres. SQLite has no exact decimal type, so
//! money columns there are `REAL`, which is what the SQLite driver decodes
//! decimals from.

use sea_orm::DbBackend;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();

        // ============================================================
        // PART 1: ACCOUNTS & CLIENTS
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Accounts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Accounts::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(Accounts::Name).string_len(255).not_null())
                    .col(status_column(Accounts::AccountType))
                    .col(status_column(Accounts::Status))
                    .col(money_column(backend, Accounts::InitialBalance))
                    .col(money_column(backend, Accounts::Balance))
                    .col(ColumnDef::new(Accounts::Currency).string_len(3).not_null())
                    .col(timestamp_column(Accounts::CreatedAt))
                    .col(timestamp_column(Accounts::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Clients::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Clients::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Clients::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(Clients::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Clients::Email).string_len(255).null())
                    .col(money_column(backend, Clients::CreditLimit))
                    .col(ColumnDef::new(Clients::PaymentTerms).integer().not_null())
                    .col(money_column(backend, Clients::TotalDebt))
                    .col(money_column(backend, Clients::TotalPaid))
                    .col(timestamp_column(Clients::CreatedAt))
                    .col(timestamp_column(Clients::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 2: INVOICES & PAYMENTS
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Invoices::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Invoices::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Invoices::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(Invoices::ClientId).uuid().null())
                    .col(ColumnDef::new(Invoices::InvoiceNumber).string_len(50).not_null())
                    .col(status_column(Invoices::InvoiceType))
                    .col(status_column(Invoices::Status))
                    .col(money_column(backend, Invoices::Total))
                    .col(ColumnDef::new(Invoices::Currency).string_len(3).not_null())
                    .col(timestamp_column(Invoices::IssueDate))
                    .col(timestamp_column(Invoices::DueDate))
                    .col(ColumnDef::new(Invoices::IsLocked).boolean().not_null().default(false))
                    .col(timestamp_column(Invoices::CreatedAt))
                    .col(timestamp_column(Invoices::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_invoices_client")
                            .from(Invoices::Table, Invoices::ClientId)
                            .to(Clients::Table, Clients::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Payments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Payments::OwnerId).uuid().not_null())
                    .col(status_column(Payments::PaymentType))
                    .col(status_column(Payments::Method))
                    .col(status_column(Payments::Status))
                    .col(money_column(backend, Payments::Amount))
                    .col(ColumnDef::new(Payments::Description).text().null())
                    .col(ColumnDef::new(Payments::AccountId).uuid().null())
                    .col(ColumnDef::new(Payments::InvoiceId).uuid().null())
                    .col(ColumnDef::new(Payments::IsLocked).boolean().not_null().default(false))
                    .col(timestamp_column(Payments::CreatedAt))
                    .col(timestamp_column(Payments::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_account")
                            .from(Payments::Table, Payments::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_invoice")
                            .from(Payments::Table, Payments::InvoiceId)
                            .to(Invoices::Table, Invoices::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 3: DEBTS & DEBT PAYMENTS
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Debts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Debts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Debts::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(Debts::ClientId).uuid().not_null())
                    .col(ColumnDef::new(Debts::Description).text().not_null())
                    .col(money_column(backend, Debts::TotalAmount))
                    .col(money_column(backend, Debts::PaidAmount))
                    .col(money_column(backend, Debts::RemainingAmount))
                    .col(status_column(Debts::Status))
                    .col(timestamp_column(Debts::DueDate))
                    .col(ColumnDef::new(Debts::PaymentTerms).integer().null())
                    .col(nullable_money_column(backend, Debts::InterestRate))
                    .col(timestamp_column(Debts::CreatedAt))
                    .col(timestamp_column(Debts::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_debts_client")
                            .from(Debts::Table, Debts::ClientId)
                            .to(Clients::Table, Clients::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DebtPayments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DebtPayments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(DebtPayments::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(DebtPayments::PaymentNumber).string_len(20).not_null())
                    .col(ColumnDef::new(DebtPayments::DebtId).uuid().not_null())
                    .col(ColumnDef::new(DebtPayments::ClientId).uuid().not_null())
                    .col(ColumnDef::new(DebtPayments::AccountId).uuid().not_null())
                    .col(money_column(backend, DebtPayments::Amount))
                    .col(status_column(DebtPayments::Method))
                    .col(status_column(DebtPayments::Status))
                    .col(ColumnDef::new(DebtPayments::Notes).text().null())
                    .col(
                        ColumnDef::new(DebtPayments::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(timestamp_column(DebtPayments::CreatedAt))
                    .col(timestamp_column(DebtPayments::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_debt_payments_debt")
                            .from(DebtPayments::Table, DebtPayments::DebtId)
                            .to(Debts::Table, Debts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_debt_payments_account")
                            .from(DebtPayments::Table, DebtPayments::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 4: FINANCIAL PERIODS
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(FinancialPeriods::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(FinancialPeriods::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(FinancialPeriods::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(FinancialPeriods::Year).integer().not_null())
                    .col(ColumnDef::new(FinancialPeriods::Month).integer().not_null())
                    .col(status_column(FinancialPeriods::Status))
                    .col(ColumnDef::new(FinancialPeriods::TotalInvoices).big_integer().not_null())
                    .col(ColumnDef::new(FinancialPeriods::TotalPayments).big_integer().not_null())
                    .col(money_column(backend, FinancialPeriods::TotalIncome))
                    .col(money_column(backend, FinancialPeriods::TotalExpenses))
                    .col(money_column(backend, FinancialPeriods::NetIncome))
                    .col(
                        ColumnDef::new(FinancialPeriods::ClosedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(timestamp_column(FinancialPeriods::CreatedAt))
                    .col(timestamp_column(FinancialPeriods::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 5: INDEXES
        // ============================================================
        manager
            .create_index(
                Index::create()
                    .name("uq_financial_periods_owner_month")
                    .table(FinancialPeriods::Table)
                    .col(FinancialPeriods::OwnerId)
                    .col(FinancialPeriods::Year)
                    .col(FinancialPeriods::Month)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_debt_payments_owner_number")
                    .table(DebtPayments::Table)
                    .col(DebtPayments::OwnerId)
                    .col(DebtPayments::PaymentNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payments_owner_created")
                    .table(Payments::Table)
                    .col(Payments::OwnerId)
                    .col(Payments::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_invoices_owner_created")
                    .table(Invoices::Table)
                    .col(Invoices::OwnerId)
                    .col(Invoices::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_debts_client")
                    .table(Debts::Table)
                    .col(Debts::ClientId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FinancialPeriods::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DebtPayments::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Debts::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Invoices::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Clients::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}

fn money_type<T: IntoIden>(backend: DbBackend, name: T) -> ColumnDef {
    let mut column = ColumnDef::new(name);
    if backend == DbBackend::Sqlite {
        column.double();
    } else {
        column.decimal_len(19, 4);
    }
    column
}

fn money_column<T: IntoIden>(backend: DbBackend, name: T) -> ColumnDef {
    let mut column = money_type(backend, name);
    column.not_null();
    column
}

fn nullable_money_column<T: IntoIden>(backend: DbBackend, name: T) -> ColumnDef {
    let mut column = money_type(backend, name);
    column.null();
    column
}

fn status_column<T: IntoIden>(name: T) -> ColumnDef {
    let mut column = ColumnDef::new(name);
    column.string_len(20).not_null();
    column
}

fn timestamp_column<T: IntoIden>(name: T) -> ColumnDef {
    let mut column = ColumnDef::new(name);
    column.timestamp_with_time_zone().not_null();
    column
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
    OwnerId,
    Name,
    AccountType,
    Status,
    InitialBalance,
    Balance,
    Currency,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Clients {
    Table,
    Id,
    OwnerId,
    Name,
    Email,
    CreditLimit,
    PaymentTerms,
    TotalDebt,
    TotalPaid,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Invoices {
    Table,
    Id,
    OwnerId,
    ClientId,
    InvoiceNumber,
    InvoiceType,
    Status,
    Total,
    Currency,
    IssueDate,
    DueDate,
    IsLocked,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
    OwnerId,
    PaymentType,
    Method,
    Status,
    Amount,
    Description,
    AccountId,
    InvoiceId,
    IsLocked,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Debts {
    Table,
    Id,
    OwnerId,
    ClientId,
    Description,
    TotalAmount,
    PaidAmount,
    RemainingAmount,
    Status,
    DueDate,
    PaymentTerms,
    InterestRate,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum DebtPayments {
    Table,
    Id,
    OwnerId,
    PaymentNumber,
    DebtId,
    ClientId,
    AccountId,
    Amount,
    Method,
    Status,
    Notes,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum FinancialPeriods {
    Table,
    Id,
    OwnerId,
    Year,
    Month,
    Status,
    TotalInvoices,
    TotalPayments,
    TotalIncome,
    TotalExpenses,
    NetIncome,
    ClosedAt,
    CreatedAt,
    UpdatedAt,
}
