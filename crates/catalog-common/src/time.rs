//! Calendar dates, timestamps and month keys for index records.
//!
//! Dates enter the system as digit strings (`YYYYMMDD` from the user,
//! `YYYYMMDDHHMM` from index filenames). Everything here is validated on
//! construction and immutable afterwards.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// First year for which imagery exists.
pub const MIN_YEAR: u32 = 2014;

/// Whether `year` is a leap year in the proleptic Gregorian calendar.
pub fn is_leap_year(year: u32) -> bool {
    if year % 100 == 0 {
        year % 400 == 0
    } else {
        year % 4 == 0
    }
}

/// Number of days in `month` (1-12) of `year`.
///
/// The first half of the year gives 31 days to odd months, the second half
/// (August onwards) to even months.
pub fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        1..=7 if month % 2 == 1 => 31,
        1..=7 => 30,
        _ if month % 2 == 0 => 31,
        _ => 30,
    }
}

fn all_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a fixed-width run of ASCII digits. Caller guarantees the slice is digits.
fn digits(s: &str, start: usize, end: usize) -> u32 {
    s[start..end]
        .bytes()
        .fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
}

/// A validated calendar date, optionally carrying hour and minute.
#[derive(Debug, Clone, Copy)]
pub struct DateValue {
    year: u32,
    month: u32,
    day: u32,
    time: Option<(u32, u32)>,
}

impl DateValue {
    /// Parse a 12-digit `YYYYMMDDHHMM` timestamp.
    pub fn parse_timestamp(s: &str) -> Option<Self> {
        if s.len() != 12 || !all_digits(s) {
            return None;
        }
        let date = parse_calendar_date(&s[..8])?;
        let hour = digits(s, 8, 10);
        let minute = digits(s, 10, 12);
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self {
            time: Some((hour, minute)),
            ..date
        })
    }

    pub fn year(&self) -> u32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn hour(&self) -> Option<u32> {
        self.time.map(|(h, _)| h)
    }

    pub fn minute(&self) -> Option<u32> {
        self.time.map(|(_, m)| m)
    }

    /// The month this date falls in.
    pub fn month_key(&self) -> MonthKey {
        MonthKey {
            year: self.year,
            month: self.month,
        }
    }

    /// `YYYYMMDD`, regardless of whether a time is attached.
    pub fn date_string(&self) -> String {
        format!("{:04}{:02}{:02}", self.year, self.month, self.day)
    }

    fn sort_key(&self) -> (u32, u32, u32, u32, u32) {
        let (hour, minute) = self.time.unwrap_or((0, 0));
        (self.year, self.month, self.day, hour, minute)
    }
}

impl PartialEq for DateValue {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for DateValue {}

impl PartialOrd for DateValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DateValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl fmt::Display for DateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}{:02}", self.year, self.month, self.day)?;
        if let Some((hour, minute)) = self.time {
            write!(f, "{:02}{:02}", hour, minute)?;
        }
        Ok(())
    }
}

impl Serialize for DateValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parse an 8-digit `YYYYMMDD` string into a validated date.
///
/// Returns `None` for anything that is not exactly eight ASCII digits, a
/// year before [`MIN_YEAR`], a month outside 1-12, or a day outside the
/// month.
pub fn parse_calendar_date(s: &str) -> Option<DateValue> {
    if s.len() != 8 || !all_digits(s) {
        return None;
    }
    let year = digits(s, 0, 4);
    let month = digits(s, 4, 6);
    let day = digits(s, 6, 8);

    if year < MIN_YEAR || !(1..=12).contains(&month) {
        return None;
    }
    if day < 1 || day > days_in_month(year, month) {
        return None;
    }
    Some(DateValue {
        year,
        month,
        day,
        time: None,
    })
}

/// Leading-digit integer parse of a positional field.
///
/// Out-of-range or empty slices read as 0, so 8-digit dates compare as if
/// their hour and minute were zero.
fn timestamp_field(s: &str, start: usize, end: usize) -> u32 {
    let end = end.min(s.len());
    if start >= end {
        return 0;
    }
    s.as_bytes()[start..end]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
}

fn timestamp_key(s: &str) -> (u32, u32, u32, u32, u32) {
    (
        timestamp_field(s, 0, 4),
        timestamp_field(s, 4, 6),
        timestamp_field(s, 6, 8),
        timestamp_field(s, 8, 10),
        timestamp_field(s, 10, 12),
    )
}

/// `a <= b` over digit-string dates or timestamps, field by field.
///
/// Works on `YYYYMMDD`, `YYYYMMDDHHMM` or a mix of the two.
pub fn compare_timestamps(a: &str, b: &str) -> bool {
    timestamp_key(a) <= timestamp_key(b)
}

/// [`compare_timestamps`] as an [`Ordering`], for sorting.
pub fn timestamp_ordering(a: &str, b: &str) -> Ordering {
    match (compare_timestamps(a, b), compare_timestamps(b, a)) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        _ => Ordering::Greater,
    }
}

/// A `YYYYMM` key identifying one month's index file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    year: u32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: u32, month: u32) -> Result<Self, MonthKeyError> {
        if !(1..=12).contains(&month) || year > 9999 {
            return Err(MonthKeyError(format!("{:04}{:02}", year, month)));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> u32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Months since year 0, so consecutive months differ by one.
    pub fn linear_index(&self) -> u32 {
        self.year * 12 + (self.month - 1)
    }

    pub fn from_linear_index(index: u32) -> Self {
        Self {
            year: index / 12,
            month: index % 12 + 1,
        }
    }

    /// The following calendar month.
    pub fn next(&self) -> Self {
        Self::from_linear_index(self.linear_index() + 1)
    }

    /// Every month from `start` through `end` inclusive; empty if `start > end`.
    pub fn range_inclusive(start: MonthKey, end: MonthKey) -> impl Iterator<Item = MonthKey> {
        (start.linear_index()..=end.linear_index()).map(MonthKey::from_linear_index)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = MonthKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 6 || !all_digits(s) {
            return Err(MonthKeyError(s.to_string()));
        }
        Self::new(digits(s, 0, 4), digits(s, 4, 6)).map_err(|_| MonthKeyError(s.to_string()))
    }
}

impl Serialize for MonthKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid month key '{0}', expected YYYYMM")]
pub struct MonthKeyError(pub String);
