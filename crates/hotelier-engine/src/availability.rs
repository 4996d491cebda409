//! Interval overlap semantics for room availability.

use chrono::{DateTime, Utc};

/// Half-open interval overlap: `[a_in, a_out)` and `[b_in, b_out)`
/// overlap iff `a_in < b_out && a_out > b_in`. A reservation ending
/// exactly when another begins does not overlap.
pub fn overlaps(
    a_in: DateTime<Utc>,
    a_out: DateTime<Utc>,
    b_in: DateTime<Utc>,
    b_out: DateTime<Utc>,
) -> bool {
    a_in < b_out && a_out > b_in
}
