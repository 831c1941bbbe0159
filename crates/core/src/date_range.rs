//! Inclusive calendar date range used to filter orders by order date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Wire/date format for order dates (`YYYY-MM-DD`).
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive `[start, end]` range of calendar days.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl ValueObject for DateRange {}

impl DateRange {
    /// Build a range; `start` must not be after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> DomainResult<Self> {
        if start > end {
            return Err(DomainError::validation("start_date must not be after end_date"));
        }
        Ok(Self { start, end })
    }

    /// Parse both bounds from ISO dates.
    pub fn parse(start: &str, end: &str) -> DomainResult<Self> {
        let start = parse_iso_date("start_date", start)?;
        let end = parse_iso_date("end_date", end)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Both bounds are inclusive.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// `YYYYMMDD_YYYYMMDD`, used to build deterministic file names.
    pub fn compact_label(&self) -> String {
        format!("{}_{}", self.start.format("%Y%m%d"), self.end.format("%Y%m%d"))
    }
}

impl core::fmt::Display for DateRange {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}..={}",
            self.start.format(ISO_DATE_FORMAT),
            self.end.format(ISO_DATE_FORMAT)
        )
    }
}

fn parse_iso_date(field: &str, value: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), ISO_DATE_FORMAT).map_err(|_| {
        DomainError::validation(format!("{field} must be a date in YYYY-MM-DD format"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn bounds_are_inclusive() {
        let range = DateRange::parse("2024-06-01", "2024-06-30").unwrap();
        assert!(range.contains(d(2024, 6, 1)));
        assert!(range.contains(d(2024, 6, 30)));
        assert!(!range.contains(d(2024, 5, 31)));
        assert!(!range.contains(d(2024, 7, 1)));
    }

    #[test]
    fn single_day_range_is_valid() {
        let range = DateRange::parse("2024-06-15", "2024-06-15").unwrap();
        assert!(range.contains(d(2024, 6, 15)));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = DateRange::parse("2024-06-30", "2024-06-01").unwrap_err();
        assert_eq!(err, DomainError::validation("start_date must not be after end_date"));
    }

    #[test]
    fn malformed_date_names_the_field() {
        let err = DateRange::parse("2024-06-01", "30/06/2024").unwrap_err();
        assert!(err.detail().starts_with("end_date"));
    }

    #[test]
    fn compact_label_is_deterministic() {
        let range = DateRange::parse("2024-06-01", "2024-06-30").unwrap();
        assert_eq!(range.compact_label(), "20240601_20240630");
        assert_eq!(range.to_string(), "2024-06-01..=2024-06-30");
    }
}
