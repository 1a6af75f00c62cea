//! Financial period arithmetic: month windows, aggregate totals and the open check.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use super::types::{PaymentStatus, PaymentType, PeriodStatus};

/// A calendar month, the unit that gets closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    year: i32,
    month: u32,
}

impl PeriodKey {
    /// Creates a key for `year`/`month`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriod` unless the month is 1-12 and the year is representable.
    pub fn new(year: i32, month: u32) -> Result<Self, LedgerError> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(LedgerError::InvalidPeriod { year, month });
        }
        Ok(Self { year, month })
    }

    /// The month containing `timestamp`.
    #[must_use]
    pub fn containing(timestamp: DateTime<Utc>) -> Self {
        Self {
            year: timestamp.year(),
            month: timestamp.month(),
        }
    }

    /// Calendar year.
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// Calendar month, 1-12.
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// The following month.
    #[must_use]
    pub const fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Midnight UTC on the first day of the month.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriod` at the edge of the representable calendar.
    pub fn start(self) -> Result<DateTime<Utc>, LedgerError> {
        Utc.with_ymd_and_hms(self.year, self.month, 1, 0, 0, 0)
            .single()
            .ok_or(LedgerError::InvalidPeriod {
                year: self.year,
                month: self.month,
            })
    }

    /// Half-open `[start, end)` window covering the month.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriod` at the edge of the representable calendar.
    pub fn bounds(self) -> Result<(DateTime<Utc>, DateTime<Utc>), LedgerError> {
        Ok((self.start()?, self.next().start()?))
    }

    /// Returns true if `timestamp` falls inside the month.
    #[must_use]
    pub fn contains(self, timestamp: DateTime<Utc>) -> bool {
        Self::containing(timestamp) == self
    }
}

impl std::fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Aggregates stored on a closed period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTotals {
    /// Invoices created in the month.
    pub total_invoices: u64,
    /// Payments created in the month, any status.
    pub total_payments: u64,
    /// Completed income.
    pub total_income: Decimal,
    /// Completed expenses.
    pub total_expenses: Decimal,
    /// `total_income - total_expenses`.
    pub net_income: Decimal,
}

impl PeriodTotals {
    /// Folds the month's payments into totals.
    pub fn compute<I>(total_invoices: u64, payments: I) -> Self
    where
        I: IntoIterator<Item = (PaymentType, PaymentStatus, Decimal)>,
    {
        let mut totals = Self {
            total_invoices,
            ..Self::default()
        };
        for (payment_type, status, amount) in payments {
            totals.total_payments += 1;
            if !status.is_completed() {
                continue;
            }
            match payment_type {
                PaymentType::Income => totals.total_income += amount,
                PaymentType::Expense => totals.total_expenses += amount,
            }
        }
        totals.net_income = totals.total_income - totals.total_expenses;
        totals
    }
}

/// Rejects writes into a closed month.
///
/// # Errors
///
/// Returns `PeriodClosed`.
pub fn ensure_open(key: PeriodKey, status: Option<PeriodStatus>) -> Result<(), LedgerError> {
    match status {
        Some(PeriodStatus::Closed) => Err(LedgerError::PeriodClosed {
            year: key.year,
            month: key.month,
        }),
        Some(PeriodStatus::Open) | None => Ok(()),
    }
}
