//! Billing arithmetic.
//!
//! All amounts are `i64` minor currency units, so the products and sums
//! here are exact — there is no floating point anywhere in the money
//! path. Totals are always recomputed from source rows; nothing here
//! caches.

use chrono::{DateTime, Utc};
use hotelier_core::models::charge::Charge;
use hotelier_core::models::payment::{Payment, PaymentStatus};
use uuid::Uuid;

/// Number of nights billed for a stay: the duration in whole 24-hour
/// blocks, rounded up. Callers validate `check_in < check_out` first;
/// any positive duration bills at least one night.
pub fn nights(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> i64 {
    let secs = (check_out - check_in).num_seconds();
    (secs + 86_400 - 1) / 86_400
}

pub fn room_total(nights: i64, base_rate: i64) -> i64 {
    nights * base_rate
}

/// Room total plus all incidental charge totals.
pub fn grand_total(room_total: i64, charges: &[Charge]) -> i64 {
    room_total + charges.iter().map(|c| c.total).sum::<i64>()
}

/// Sum of `Completed` payments, optionally excluding one payment (used
/// when recomputing during an update of that same payment).
pub fn completed_total(payments: &[Payment], exclude: Option<Uuid>) -> i64 {
    payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Completed && Some(p.id) != exclude)
        .map(|p| p.amount)
        .sum()
}

/// Grand total minus completed payments, floored at zero.
pub fn due_amount(grand_total: i64, completed_total: i64) -> i64 {
    (grand_total - completed_total).max(0)
}
