use chrono::{DateTime, FixedOffset, Utc};

/// The business calendar runs on Bishkek time, a fixed UTC+6 offset with no
/// daylight saving.
pub const BISHKEK_UTC_OFFSET_SECONDS: i32 = 6 * 3600;

fn bishkek_offset() -> FixedOffset {
    FixedOffset::east_opt(BISHKEK_UTC_OFFSET_SECONDS).expect("UTC+6 is a valid fixed offset")
}

/// ISO-8601 timestamp carrying the `+06:00` offset, stamped on snapshots.
pub fn bishkek_timestamp(now: DateTime<Utc>) -> String {
    now.with_timezone(&bishkek_offset())
        .format("%Y-%m-%dT%H:%M:%S%:z")
        .to_string()
}

/// `YYYY-MM-DD` calendar date in Bishkek time, used for allocation rows.
pub fn bishkek_date(now: DateTime<Utc>) -> String {
    now.with_timezone(&bishkek_offset())
        .format("%Y-%m-%d")
        .to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn timestamp_carries_the_plus_six_offset() {
        let now = Utc.with_ymd_and_hms(2026, 8, 28, 12, 30, 45).unwrap();
        assert_eq!(bishkek_timestamp(now), "2026-08-28T18:30:45+06:00");
    }

    #[test]
    fn date_rolls_over_at_bishkek_midnight_not_utc_midnight() {
        let late_utc = Utc.with_ymd_and_hms(2026, 8, 28, 19, 0, 0).unwrap();
        assert_eq!(bishkek_date(late_utc), "2026-08-29");

        let early_utc = Utc.with_ymd_and_hms(2026, 8, 28, 17, 59, 59).unwrap();
        assert_eq!(bishkek_date(early_utc), "2026-08-28");
    }
}
