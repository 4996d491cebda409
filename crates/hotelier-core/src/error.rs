//! Error types for the Hotelier system.
//!
//! Every operation returns these as values — domain conflicts are never
//! raised as panics or stringly-typed exceptions, so callers can
//! pattern-match and map each kind to a transport response. Conflict
//! variants carry the structured detail (current state, attempted value,
//! computed totals) a caller needs to render an actionable message
//! without re-querying.

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::reservation::ReservationStatus;

#[derive(Debug, Error)]
pub enum HotelierError {
    /// Malformed input: bad dates, non-positive amounts, uniqueness
    /// violations. Always recoverable by the caller.
    #[error("validation failed on `{field}`: {message}")]
    Validation { field: String, message: String },

    /// The referenced entity does not exist within the caller's tenant.
    /// Cross-tenant access deliberately reports as not-found so that
    /// existence never leaks across tenants.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// An overlapping, non-cancelled reservation already holds the room.
    #[error("room {room_id} is not available between {check_in} and {check_out}")]
    RoomNotAvailable {
        room_id: Uuid,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    },

    /// The requested lifecycle transition is not in the allowed table.
    #[error("reservation cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        from: ReservationStatus,
        to: ReservationStatus,
    },

    /// Edit attempted on a reservation that is no longer editable.
    #[error("reservation is {status:?} and can only change through a status transition")]
    BookingLocked { status: ReservationStatus },

    /// The completed-payment total would exceed the grand total.
    #[error(
        "completed payments {completed} plus {attempted} would exceed the grand total {grand_total}"
    )]
    Overpayment {
        grand_total: i64,
        completed: i64,
        attempted: i64,
    },

    /// Checkout attempted while the reservation still owes money.
    #[error("checkout refused: outstanding balance of {due}")]
    OutstandingBalance { due: i64 },

    /// Manual room-status change or deletion blocked by an active check-in.
    #[error("room {room_id} has a checked-in reservation")]
    OccupiedRoom { room_id: Uuid },

    /// A daily close already exists for this tenant and date.
    #[error("daily close already exists for {date_key}")]
    DailyCloseExists { date_key: NaiveDate },

    /// Storage or transaction failure. Surfaced as-is; the core never
    /// retries silently.
    #[error("database error: {0}")]
    Database(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type HotelierResult<T> = Result<T, HotelierError>;
