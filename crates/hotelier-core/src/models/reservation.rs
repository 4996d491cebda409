//! Reservation domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a reservation.
///
/// The allowed transitions live in `hotelier-engine::lifecycle`;
/// `CheckedOut` and `Cancelled` are terminal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub room_id: Uuid,
    pub guest_id: Option<Uuid>,
    /// Opaque staff actor who created the booking. Supplied by the
    /// authentication collaborator; the core never interprets it.
    pub created_by: Option<Uuid>,
    /// Stay interval, half-open: `[check_in, check_out)`. Always
    /// `check_in < check_out`; same-day stays are legal.
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub status: ReservationStatus,
    /// Nights × room-type base rate in minor currency units, captured at
    /// create/edit time. Never recomputed when the rate later changes.
    pub total_price: i64,
    /// Set exactly once, the first time the reservation enters
    /// `CheckedIn`.
    pub checked_in_at: Option<DateTime<Utc>>,
    /// Set exactly once, the first time the reservation enters
    /// `CheckedOut`.
    pub checked_out_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a reservation. The total price and initial
/// `Pending` status are computed server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReservation {
    pub tenant_id: Uuid,
    pub room_id: Uuid,
    pub guest_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Fields that can be updated while a reservation is still editable
/// (`Pending` or `Confirmed`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateReservation {
    pub room_id: Option<Uuid>,
    /// `Some(Some(id))` = assign, `Some(None)` = clear, `None` = keep.
    pub guest_id: Option<Option<Uuid>>,
    pub check_in: Option<DateTime<Utc>>,
    pub check_out: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}
