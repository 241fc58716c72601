//! Validation of user-entered date ranges.
//!
//! All rules are checked and reported together. Range rules only run for
//! inputs that parsed as calendar dates.

use chrono::{Datelike, NaiveDate, Utc};

use catalog_common::{
    compare_timestamps, parse_calendar_date, DateValue, MonthKey, ValidationError,
    ValidationIssue,
};

/// A validated, ordered pair of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateValue,
    pub end: DateValue,
}

/// Checks date strings against format, floor, ordering and "not in future".
#[derive(Debug, Clone)]
pub struct DateRangeValidator {
    earliest: DateValue,
}

impl DateRangeValidator {
    pub fn new(earliest: DateValue) -> Self {
        Self { earliest }
    }

    /// Validate against today's UTC date.
    pub fn validate(&self, start: &str, end: &str) -> Result<DateRange, ValidationError> {
        self.validate_at(start, end, Utc::now().date_naive())
    }

    /// Validate with an explicit "today".
    pub fn validate_at(
        &self,
        start: &str,
        end: &str,
        today: NaiveDate,
    ) -> Result<DateRange, ValidationError> {
        let mut issues = Vec::new();

        let start_date = parse_calendar_date(start);
        if start_date.is_none() {
            issues.push(ValidationIssue::InvalidStart(start.to_string()));
        }
        let end_date = parse_calendar_date(end);
        if end_date.is_none() {
            issues.push(ValidationIssue::InvalidEnd(end.to_string()));
        }

        if start_date.is_some() && end_date.is_some() && !compare_timestamps(start, end) {
            issues.push(ValidationIssue::StartAfterEnd {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        let earliest = self.earliest.date_string();
        if start_date.is_some() && !compare_timestamps(&earliest, start) {
            issues.push(ValidationIssue::StartBeforeEarliest {
                start: start.to_string(),
                earliest,
            });
        }

        let today = today.format("%Y%m%d").to_string();
        if end_date.is_some() && !compare_timestamps(end, &today) {
            issues.push(ValidationIssue::EndInFuture {
                end: end.to_string(),
                today,
            });
        }

        match (start_date, end_date) {
            (Some(start), Some(end)) if issues.is_empty() => Ok(DateRange { start, end }),
            _ => Err(ValidationError::new(issues)),
        }
    }

    /// Check that `month` lies between the earliest date's month and the
    /// current UTC month.
    pub fn validate_month(&self, month: MonthKey) -> Result<MonthKey, ValidationError> {
        self.validate_month_at(month, Utc::now().date_naive())
    }

    /// Validate a month with an explicit "today".
    pub fn validate_month_at(
        &self,
        month: MonthKey,
        today: NaiveDate,
    ) -> Result<MonthKey, ValidationError> {
        let mut issues = Vec::new();

        let earliest = self.earliest.month_key();
        if month < earliest {
            issues.push(ValidationIssue::MonthBeforeEarliest { month, earliest });
        }

        let current = i64::from(today.year()) * 12 + i64::from(today.month0());
        if i64::from(month.linear_index()) > current {
            issues.push(ValidationIssue::MonthInFuture {
                month,
                current: today.format("%Y%m").to_string(),
            });
        }

        if issues.is_empty() {
            Ok(month)
        } else {
            Err(ValidationError::new(issues))
        }
    }
}
