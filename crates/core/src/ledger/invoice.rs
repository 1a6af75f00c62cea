//! Invoice guards and read-time status.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::LedgerError;
use super::types::InvoiceStatus;

/// Rejects writes against an invoice frozen by a closed period.
///
/// # Errors
///
/// Returns `InvoiceLocked`.
pub fn ensure_unlocked(invoice_id: Uuid, is_locked: bool) -> Result<(), LedgerError> {
    if is_locked {
        return Err(LedgerError::InvoiceLocked(invoice_id));
    }
    Ok(())
}

/// Status as shown to readers: a sent invoice past its due date reads as overdue.
#[must_use]
pub fn effective_status(stored: InvoiceStatus, due_date: DateTime<Utc>, now: DateTime<Utc>) -> InvoiceStatus {
    match stored {
        InvoiceStatus::Sent if now > due_date => InvoiceStatus::Overdue,
        other => other,
    }
}

/// Validates a requested status change.
///
/// Cancelled invoices are terminal and a paid invoice cannot return to draft.
///
/// # Errors
///
/// Returns `InvalidStatusTransition`.
pub fn validate_transition(current: InvoiceStatus, requested: InvoiceStatus) -> Result<(), LedgerError> {
    let allowed = match current {
        InvoiceStatus::Cancelled => requested == InvoiceStatus::Cancelled,
        InvoiceStatus::Paid => requested != InvoiceStatus::Draft,
        InvoiceStatus::Draft | InvoiceStatus::Sent | InvoiceStatus::Overdue => true,
    };
    if allowed {
        Ok(())
    } else {
        Err(LedgerError::InvalidStatusTransition {
            entity: "invoice",
            from: current.to_string(),
            to: requested.to_string(),
        })
    }
}
