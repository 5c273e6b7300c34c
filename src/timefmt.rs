use chrono::{DateTime, TimeZone, Utc};

/// Format an epoch-seconds timestamp as UTC string, or return a placeholder on error.
pub fn format_epoch_seconds(ts_seconds: f64) -> String {
    let millis = (ts_seconds * 1000.0).round() as i64;
    match Utc.timestamp_millis_opt(millis) {
        chrono::LocalResult::Single(datetime) => datetime.format("%Y-%m-%d %H:%M").to_string(),
        _ => "invalid timestamp".to_string(),
    }
}

/// Format the report generation instant.
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d %H:%M UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_epoch_seconds() {
        assert_eq!(format_epoch_seconds(1_735_689_600.0), "2025-01-01 00:00");
        assert_eq!(format_epoch_seconds(1_735_689_659.9), "2025-01-01 00:00");
    }

    #[test]
    fn test_format_epoch_seconds_out_of_range() {
        assert_eq!(format_epoch_seconds(f64::MAX), "invalid timestamp");
    }

    #[test]
    fn test_format_instant() {
        let instant = Utc.with_ymd_and_hms(2025, 3, 15, 9, 5, 0).unwrap();
        assert_eq!(format_instant(instant), "2025-03-15 09:05 UTC");
    }
}
