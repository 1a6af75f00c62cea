//! Helpers shared by the ledger repositories.

use bizledger_core::ledger::{LedgerError, PeriodKey, period};
use bizledger_shared::types::{Currency, OwnerId};
use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ColumnTrait, ConnectionTrait, DbBackend, DbErr, EntityTrait, QueryFilter, QuerySelect, Select};

use crate::entities::{financial_periods, sea_orm_active_enums::PeriodStatus};
use crate::error::LedgerStoreError;

/// Current time in the stored representation.
pub(crate) fn now() -> DateTimeWithTimeZone {
    Utc::now().into()
}

/// Converts a UTC timestamp to the stored representation.
pub(crate) fn to_stored(timestamp: DateTime<Utc>) -> DateTimeWithTimeZone {
    timestamp.into()
}

/// Converts a stored timestamp to UTC.
pub(crate) fn to_utc(timestamp: DateTimeWithTimeZone) -> DateTime<Utc> {
    timestamp.with_timezone(&Utc)
}

/// Adds `SELECT ... FOR UPDATE` on backends with row locks.
///
/// SQLite serializes writers on the whole database instead.
pub(crate) fn for_update<E: EntityTrait>(select: Select<E>, backend: DbBackend) -> Select<E> {
    if backend == DbBackend::Sqlite {
        select
    } else {
        select.lock_exclusive()
    }
}

/// Parses a currency code against the allow-list.
pub(crate) fn parse_currency(code: &str) -> Result<Currency, LedgerError> {
    code.parse::<Currency>()
        .map_err(|_| LedgerError::UnsupportedCurrency(code.to_string()))
}

/// Looks up the stored status of an owner's period, if one was ever recorded.
pub(crate) async fn period_status<C: ConnectionTrait>(
    conn: &C,
    owner_id: OwnerId,
    key: PeriodKey,
) -> Result<Option<PeriodStatus>, DbErr> {
    let period = financial_periods::Entity::find()
        .filter(financial_periods::Column::OwnerId.eq(owner_id.into_inner()))
        .filter(financial_periods::Column::Year.eq(key.year()))
        .filter(financial_periods::Column::Month.eq(month_column(key)))
        .one(conn)
        .await?;
    Ok(period.map(|p| p.status))
}

/// Rejects a write dated inside a closed month.
pub(crate) async fn ensure_period_open<C: ConnectionTrait>(
    conn: &C,
    owner_id: OwnerId,
    timestamp: DateTime<Utc>,
) -> Result<(), LedgerStoreError> {
    let key = PeriodKey::containing(timestamp);
    let status = period_status(conn, owner_id, key).await?;
    period::ensure_open(key, status.map(Into::into))?;
    Ok(())
}

/// Month as stored in `financial_periods.month`.
pub(crate) fn month_column(key: PeriodKey) -> i32 {
    i32::try_from(key.month()).unwrap_or(i32::MAX)
}
