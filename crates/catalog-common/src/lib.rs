//! Common types shared across the satellite image catalog crates.

pub mod channel;
pub mod error;
pub mod record;
pub mod time;

pub use channel::{Channel, HemisphereScope, UnknownChannel};
pub use error::{
    CatalogError, CatalogResult, FetchError, ParseError, ParseErrorKind, ValidationError,
    ValidationIssue,
};
pub use record::{ImageFilename, IndexRecord, PixelRange, ValueScale};
pub use time::{
    compare_timestamps, days_in_month, is_leap_year, parse_calendar_date, timestamp_ordering,
    DateValue, MonthKey, MonthKeyError, MIN_YEAR,
};
