//! Time handling for hourly reanalysis data.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// An inclusive `[start, end]` time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TimeWindowError> {
        if start > end {
            return Err(TimeWindowError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Both ends are inclusive.
    pub fn contains(&self, dt: &DateTime<Utc>) -> bool {
        dt >= &self.start && dt <= &self.end
    }

    /// Widen the window by `hours` on each side.
    ///
    /// Fails if either end would leave the representable time range.
    pub fn padded(&self, hours: i64) -> Result<Self, TimeWindowError> {
        let out_of_range = || TimeWindowError::PaddingOutOfRange { hours };
        let pad = Duration::try_hours(hours).ok_or_else(out_of_range)?;
        let start = self.start.checked_sub_signed(pad).ok_or_else(out_of_range)?;
        let end = self.end.checked_add_signed(pad).ok_or_else(out_of_range)?;
        Self::new(start, end)
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Parse an ISO 8601 timestamp, assuming UTC when no offset is given.
    pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, TimeWindowError> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }

        for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
            if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(Utc.from_utc_datetime(&ndt));
            }
        }

        Err(TimeWindowError::InvalidFormat(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeWindowError {
    #[error("time window start {start} is after end {end}")]
    Inverted {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("padding of {hours} hours moves the window out of range")]
    PaddingOutOfRange { hours: i64 },
}

/// Minutes elapsed since the top of the hour, including the fractional
/// part contributed by seconds and sub-second precision.
pub fn minutes_past_hour(dt: &DateTime<Utc>) -> f64 {
    dt.minute() as f64 + dt.second() as f64 / 60.0 + dt.nanosecond() as f64 / 60.0e9
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, s).unwrap()
    }

    #[test]
    fn test_window_is_inclusive() {
        let window = TimeWindow::new(at(0, 0, 0), at(2, 0, 0)).unwrap();
        assert!(window.contains(&at(0, 0, 0)));
        assert!(window.contains(&at(2, 0, 0)));
        assert!(!window.contains(&at(2, 0, 1)));
    }

    #[test]
    fn test_inverted_window() {
        let err = TimeWindow::new(at(3, 0, 0), at(2, 0, 0)).unwrap_err();
        assert!(matches!(err, TimeWindowError::Inverted { .. }));
    }

    #[test]
    fn test_padded() {
        let window = TimeWindow::new(at(5, 12, 0), at(7, 40, 0))
            .unwrap()
            .padded(1)
            .unwrap();
        assert_eq!(window.start, at(4, 12, 0));
        assert_eq!(window.end, at(8, 40, 0));
    }

    #[test]
    fn test_padded_out_of_range() {
        let window = TimeWindow::new(at(5, 0, 0), at(6, 0, 0)).unwrap();
        for hours in [i64::MAX / 2, i64::MAX, 24 * 365 * 300_000] {
            let err = window.padded(hours).unwrap_err();
            assert_eq!(err, TimeWindowError::PaddingOutOfRange { hours });
        }
    }

    #[test]
    fn test_minutes_past_hour() {
        assert_eq!(minutes_past_hour(&at(1, 0, 0)), 0.0);
        assert_eq!(minutes_past_hour(&at(1, 30, 0)), 30.0);
        assert_eq!(minutes_past_hour(&at(1, 59, 30)), 59.5);
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(TimeWindow::parse_timestamp("2024-03-01T01:30:00Z").unwrap(), at(1, 30, 0));
        assert_eq!(TimeWindow::parse_timestamp("2024-03-01 01:30:00").unwrap(), at(1, 30, 0));
        assert!(TimeWindow::parse_timestamp("yesterday").is_err());
    }
}
