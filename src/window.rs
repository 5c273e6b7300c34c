/// Lookback window handling for activity reports
///
/// Turns a "last N days" request plus a reference instant into the epoch bound
/// handed to the history fetch, and maps event timestamps to day offsets
/// (bucket 0 = the 24 hours leading up to `now`).
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Upper bound accepted for a lookback window.
pub const MAX_WINDOW_DAYS: u32 = 365;

/// Returns the epoch-seconds timestamp `n_days` days before `now`.
pub fn threshold_timestamp(now: DateTime<Utc>, n_days: u32) -> f64 {
    epoch_seconds(now) - f64::from(n_days) * SECONDS_PER_DAY
}

/// Returns `floor((now - event_timestamp) / 86400)`.
///
/// No clamping: events after `now` yield negative offsets and very old
/// events yield offsets larger than the window.
pub fn day_offset(event_timestamp: f64, now: DateTime<Utc>) -> i64 {
    ((epoch_seconds(now) - event_timestamp) / SECONDS_PER_DAY).floor() as i64
}

/// Converts an instant to fractional epoch seconds (microsecond precision).
pub fn epoch_seconds(instant: DateTime<Utc>) -> f64 {
    instant.timestamp_micros() as f64 / 1_000_000.0
}

/// A parsed lookback window anchored at a reference instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityWindow {
    /// Reference instant ("now") for the run
    pub now: DateTime<Utc>,
    /// Number of days to look back (at least 1)
    pub days: u32,
}

impl ActivityWindow {
    pub fn new(now: DateTime<Utc>, days: u32) -> Result<Self> {
        if days == 0 || days > MAX_WINDOW_DAYS {
            return Err(anyhow!(
                "Invalid window length: {} days. Expected 1 to {}",
                days,
                MAX_WINDOW_DAYS
            ));
        }
        Ok(Self { now, days })
    }

    /// Parse a window length string and anchor it at `now`
    ///
    /// Supported formats:
    /// - "7" or "7d" → 7 days
    /// - "2w" → 14 days
    pub fn parse(window: &str, now: DateTime<Utc>) -> Result<Self> {
        Self::new(now, parse_days(window)?)
    }

    pub fn threshold_timestamp(&self) -> f64 {
        threshold_timestamp(self.now, self.days)
    }

    pub fn day_offset(&self, event_timestamp: f64) -> i64 {
        day_offset(event_timestamp, self.now)
    }
}

fn parse_days(window: &str) -> Result<u32> {
    let window = window.trim().to_ascii_lowercase();

    let (digits, multiplier) = if let Some(weeks) = window.strip_suffix('w') {
        (weeks, 7)
    } else if let Some(days) = window.strip_suffix('d') {
        (days, 1)
    } else {
        (window.as_str(), 1)
    };

    digits
        .parse::<u32>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(|| {
            anyhow!(
                "Invalid window format: '{}'. Expected: '7', '7d' or '2w'",
                window
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_threshold_timestamp() {
        let now = fixed_now();
        let threshold = threshold_timestamp(now, 3);
        assert_eq!(threshold, now.timestamp() as f64 - 3.0 * 86_400.0);
    }

    #[test]
    fn test_day_offset_today_and_yesterday() {
        let now = fixed_now();
        let now_ts = now.timestamp() as f64;
        assert_eq!(day_offset(now_ts, now), 0);
        assert_eq!(day_offset(now_ts - 60.0, now), 0);
        assert_eq!(day_offset(now_ts - 86_400.0, now), 1);
        assert_eq!(day_offset(now_ts - 86_400.0 * 2.5, now), 2);
    }

    #[test]
    fn test_day_offset_future_is_negative() {
        let now = fixed_now();
        let now_ts = now.timestamp() as f64;
        assert_eq!(day_offset(now_ts + 10.0, now), -1);
    }

    #[test]
    fn test_day_offset_beyond_window_is_not_capped() {
        let now = fixed_now();
        let now_ts = now.timestamp() as f64;
        assert_eq!(day_offset(now_ts - 86_400.0 * 40.0, now), 40);
    }

    #[test]
    fn test_parse_days() {
        let now = fixed_now();
        assert_eq!(ActivityWindow::parse("7", now).unwrap().days, 7);
        assert_eq!(ActivityWindow::parse("5d", now).unwrap().days, 5);
        assert_eq!(ActivityWindow::parse("2w", now).unwrap().days, 14);
        assert_eq!(ActivityWindow::parse(" 3D ", now).unwrap().days, 3);
    }

    #[test]
    fn test_invalid_window() {
        let now = fixed_now();
        assert!(ActivityWindow::parse("0", now).is_err());
        assert!(ActivityWindow::parse("-3", now).is_err());
        assert!(ActivityWindow::parse("week", now).is_err());
        assert!(ActivityWindow::parse("400", now).is_err());
    }
}
