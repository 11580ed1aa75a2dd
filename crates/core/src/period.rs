use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical layout of every stored `date` value.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Inclusive, optionally open-ended range of calendar days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start, self.end) {
            (Some(s), Some(e)) => write!(f, "{s} to {e}"),
            (Some(s), None) => write!(f, "from {s}"),
            (None, Some(e)) => write!(f, "until {e}"),
            (None, None) => write!(f, "all dates"),
        }
    }
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        DateRange { start, end }
    }

    pub fn is_unbounded(self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Lower bound as a stored timestamp: start of the first day.
    pub fn lower_bound(self) -> Option<String> {
        self.start.map(|d| format!("{d} 00:00:00"))
    }

    /// Upper bound as a stored timestamp: last second of the final day.
    pub fn upper_bound(self) -> Option<String> {
        self.end.map(|d| format!("{d} 23:59:59"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn bounds_cover_whole_days() {
        let range = DateRange::new(Some(day(2024, 3, 1)), Some(day(2024, 3, 31)));
        assert_eq!(range.lower_bound().as_deref(), Some("2024-03-01 00:00:00"));
        assert_eq!(range.upper_bound().as_deref(), Some("2024-03-31 23:59:59"));
    }

    #[test]
    fn open_ended_bounds() {
        let range = DateRange::new(None, Some(day(2024, 3, 31)));
        assert_eq!(range.lower_bound(), None);
        assert_eq!(range.upper_bound().as_deref(), Some("2024-03-31 23:59:59"));
        assert!(!range.is_unbounded());
        assert!(DateRange::default().is_unbounded());
    }

    #[test]
    fn display() {
        assert_eq!(
            DateRange::new(Some(day(2024, 1, 1)), Some(day(2024, 12, 31))).to_string(),
            "2024-01-01 to 2024-12-31"
        );
        assert_eq!(DateRange::default().to_string(), "all dates");
    }

    #[test]
    fn timestamp_format() {
        let ts = day(2024, 3, 1).and_hms_opt(10, 0, 0).unwrap();
        assert_eq!(format_timestamp(ts), "2024-03-01 10:00:00");
    }
}
