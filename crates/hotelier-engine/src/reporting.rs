//! Reporting-day boundaries.
//!
//! A tenant's financial day is a fixed offset from UTC — not server
//! local time. This module is the only place a "day" is computed, for
//! both the daily close and date-only input parsing.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use hotelier_core::error::{HotelierError, HotelierResult};

/// UTC window `[start, end)` covering the local calendar day `date_key`
/// for a reporting zone `offset_minutes` ahead of UTC.
pub fn day_window(date_key: NaiveDate, offset_minutes: i32) -> (DateTime<Utc>, DateTime<Utc>) {
    let local_midnight = date_key.and_time(NaiveTime::MIN);
    let start = Utc.from_utc_datetime(&(local_midnight - Duration::minutes(i64::from(offset_minutes))));
    (start, start + Duration::days(1))
}

/// The reporting-day date key an instant falls on.
pub fn date_key_of(ts: DateTime<Utc>, offset_minutes: i32) -> NaiveDate {
    (ts + Duration::minutes(i64::from(offset_minutes))).date_naive()
}

/// Parse a `YYYY-MM-DD` date key from caller input.
pub fn parse_date_key(raw: &str) -> HotelierResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| HotelierError::Validation {
        field: "date_key".into(),
        message: format!("expected YYYY-MM-DD, got `{raw}`"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn utc_window_is_the_calendar_day() {
        let (start, end) = day_window(date(2025, 1, 1), 0);
        assert_eq!(start.to_rfc3339(), "2025-01-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2025-01-02T00:00:00+00:00");
    }

    #[test]
    fn positive_offset_shifts_window_earlier_in_utc() {
        // UTC+2: local midnight is 22:00 UTC the previous day.
        let (start, end) = day_window(date(2025, 1, 1), 120);
        assert_eq!(start.to_rfc3339(), "2024-12-31T22:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2025-01-01T22:00:00+00:00");
    }

    #[test]
    fn negative_offset_shifts_window_later_in_utc() {
        // UTC-5: local midnight is 05:00 UTC the same day.
        let (start, _) = day_window(date(2025, 1, 1), -300);
        assert_eq!(start.to_rfc3339(), "2025-01-01T05:00:00+00:00");
    }

    #[test]
    fn date_key_roundtrips_through_window() {
        for offset in [-300, 0, 120, 345] {
            let (start, end) = day_window(date(2025, 6, 15), offset);
            assert_eq!(date_key_of(start, offset), date(2025, 6, 15));
            // Last instant of the window is still the same local day.
            assert_eq!(
                date_key_of(end - Duration::seconds(1), offset),
                date(2025, 6, 15)
            );
            // The window end itself belongs to the next day.
            assert_eq!(date_key_of(end, offset), date(2025, 6, 16));
        }
    }

    #[test]
    fn date_key_parsing() {
        assert_eq!(parse_date_key("2025-01-01").unwrap(), date(2025, 1, 1));
        assert!(parse_date_key("01/01/2025").is_err());
        assert!(parse_date_key("2025-13-01").is_err());
    }
}
