//! Database-specific error types and conversions.
//!
//! The transactional guard scripts signal domain conflicts by throwing
//! marker strings (`guard:<kind>[:<arg>...]`). The repository
//! implementations recognize those markers — and the unique-index
//! violations that act as final race-breakers — and surface them as
//! typed `HotelierError` values instead of generic database failures.

use hotelier_core::error::HotelierError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for HotelierError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => HotelierError::NotFound { entity, id },
            // Decode/migration failures are invariant breaches, not
            // storage faults.
            DbError::Migration(msg) => HotelierError::Internal(msg),
            DbError::Surreal(e) => HotelierError::Database(e.to_string()),
        }
    }
}

/// Markers thrown by the transactional guard scripts.
pub(crate) mod guard {
    /// Target row missing or owned by another tenant.
    pub const NOT_FOUND: &str = "guard:not_found";
    /// Overlapping non-cancelled reservation holds the room.
    pub const ROOM_NOT_AVAILABLE: &str = "guard:room_not_available";
    /// Reservation status changed since the caller read it.
    pub const STALE_STATUS: &str = "guard:stale_status";
    /// Args: grand total, completed total, attempted amount.
    pub const OVERPAYMENT: &str = "guard:overpayment";
    /// Arg: due amount.
    pub const OUTSTANDING_BALANCE: &str = "guard:outstanding_balance";
    /// Arg: current reservation status.
    pub const BOOKING_LOCKED: &str = "guard:booking_locked";
    pub const ROOM_OCCUPIED: &str = "guard:room_occupied";
    pub const CLOSE_EXISTS: &str = "guard:close_exists";
}

/// Collapse the statement-level errors of a transaction response into a
/// single message, returning `Ok(())` when every statement succeeded.
///
/// `Response::check` surfaces only the *first* statement error. When a
/// guard script throws mid-transaction the rollback makes several
/// statements fail, and the generic "failed transaction" notice can sort
/// ahead of the statement that actually carries the `guard:` marker.
/// Joining every statement error keeps the marker visible to
/// [`guard_args`] and [`index_violation`] regardless of statement order.
pub(crate) fn check_tx(result: &mut surrealdb::Response) -> Result<(), String> {
    let errors = result.take_errors();
    if errors.is_empty() {
        return Ok(());
    }
    let mut entries: Vec<(usize, String)> =
        errors.into_iter().map(|(i, e)| (i, e.to_string())).collect();
    entries.sort_by_key(|(i, _)| *i);
    Err(entries
        .into_iter()
        .map(|(_, m)| m)
        .collect::<Vec<_>>()
        .join("; "))
}

/// If `message` carries the given guard marker, return the `:`-separated
/// arguments thrown after it (possibly empty).
pub(crate) fn guard_args(message: &str, marker: &str) -> Option<Vec<String>> {
    let start = message.find(marker)?;
    let rest = &message[start + marker.len()..];
    let rest = rest.strip_prefix(':').unwrap_or("");
    Some(
        rest.split(':')
            .map(|arg| {
                arg.trim_matches(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
                    .to_string()
            })
            .filter(|arg| !arg.is_empty())
            .collect(),
    )
}

/// Whether `message` reports a violation of the named unique index.
pub(crate) fn index_violation(message: &str, index: &str) -> bool {
    message.contains(index)
        && (message.contains("already contains") || message.contains("unique"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_args_extracts_payload() {
        let msg = "An error occurred: guard:overpayment:25000:20000:6000";
        let args = guard_args(msg, guard::OVERPAYMENT).unwrap();
        assert_eq!(args, vec!["25000", "20000", "6000"]);
    }

    #[test]
    fn guard_args_without_payload() {
        let msg = "An error occurred: guard:room_not_available";
        let args = guard_args(msg, guard::ROOM_NOT_AVAILABLE).unwrap();
        assert!(args.is_empty());
    }

    #[test]
    fn guard_args_absent_marker() {
        assert!(guard_args("some other failure", guard::OVERPAYMENT).is_none());
    }

    #[test]
    fn index_violation_matches_by_name() {
        let msg = "Database index `idx_daily_close_tenant_date` already contains \
                   ['t', '2025-01-01']";
        assert!(index_violation(msg, "idx_daily_close_tenant_date"));
        assert!(!index_violation(msg, "idx_room_tenant_number"));
    }
}
