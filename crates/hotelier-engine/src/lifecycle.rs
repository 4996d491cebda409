//! Reservation lifecycle state machine.
//!
//! The single source of truth for which status transitions exist and
//! which room-status side effects they trigger. Everything here is pure;
//! applying a transition (with its atomicity requirements) is the
//! repository's job.

use hotelier_core::models::reservation::ReservationStatus;
use hotelier_core::models::room::RoomStatus;

/// Transitions permitted from `from`.
///
/// `CheckedOut` and `Cancelled` are terminal.
pub fn allowed_targets(from: &ReservationStatus) -> &'static [ReservationStatus] {
    use ReservationStatus::*;
    match from {
        Pending => &[Confirmed, Cancelled],
        Confirmed => &[CheckedIn, Cancelled],
        CheckedIn => &[CheckedOut],
        CheckedOut | Cancelled => &[],
    }
}

pub fn transition_allowed(from: &ReservationStatus, to: &ReservationStatus) -> bool {
    allowed_targets(from).contains(to)
}

/// Room-status side effect of entering `to`, if any.
///
/// The `CheckedOut → Available` effect must never override a room that
/// staff put in `Maintenance`; that guard is applied where the effect is
/// written, since it depends on the room's current state.
pub fn room_status_for(to: &ReservationStatus) -> Option<RoomStatus> {
    match to {
        ReservationStatus::CheckedIn => Some(RoomStatus::Occupied),
        ReservationStatus::CheckedOut => Some(RoomStatus::Available),
        _ => None,
    }
}

/// Whether a reservation's room/guest/dates can still be edited.
/// Everything past `Confirmed` only changes through transitions.
pub fn is_editable(status: &ReservationStatus) -> bool {
    matches!(
        status,
        ReservationStatus::Pending | ReservationStatus::Confirmed
    )
}
