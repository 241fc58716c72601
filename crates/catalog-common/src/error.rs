//! Error types for the satellite image catalog.

use std::sync::Arc;

use thiserror::Error;

use crate::time::MonthKey;

/// Result type alias using CatalogError.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Primary error type for catalog operations.
///
/// Cloneable so one failed month load can be reported to every waiter.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to fetch index for {month}: {source}")]
    Fetch {
        month: MonthKey,
        #[source]
        source: FetchError,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl CatalogError {
    /// Short machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogError::Validation(e) if e.has_format_issue() => "FormatError",
            CatalogError::Validation(_) => "RangeError",
            CatalogError::Fetch { .. } => "FetchError",
            CatalogError::Parse(_) => "ParseError",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            CatalogError::Validation(_) => 400,
            CatalogError::Fetch {
                source: FetchError::Status { status: 404, .. } | FetchError::Missing(_),
                ..
            } => 404,
            CatalogError::Fetch { .. } | CatalogError::Parse(_) => 502,
        }
    }
}

/// One reason a date range was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("start date '{0}' is not a valid YYYYMMDD date")]
    InvalidStart(String),

    #[error("end date '{0}' is not a valid YYYYMMDD date")]
    InvalidEnd(String),

    #[error("start date {start} is after end date {end}")]
    StartAfterEnd { start: String, end: String },

    #[error("start date {start} is before the earliest available date {earliest}")]
    StartBeforeEarliest { start: String, earliest: String },

    #[error("end date {end} is in the future (today is {today})")]
    EndInFuture { end: String, today: String },

    #[error("month {month} is before the earliest available month {earliest}")]
    MonthBeforeEarliest { month: MonthKey, earliest: MonthKey },

    #[error("month {month} is in the future (current month is {current})")]
    MonthInFuture { month: MonthKey, current: String },
}

impl ValidationIssue {
    /// Shape or calendar problems, as opposed to range problems.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            ValidationIssue::InvalidStart(_) | ValidationIssue::InvalidEnd(_)
        )
    }
}

/// A rejected date range; carries every violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid date range: {}", self.message())]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    pub fn has_format_issue(&self) -> bool {
        self.issues.iter().any(ValidationIssue::is_format)
    }

    pub fn has_range_issue(&self) -> bool {
        self.issues.iter().any(|i| !i.is_format())
    }

    /// All issues joined into a single user-facing sentence.
    pub fn message(&self) -> String {
        self.issues
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Transport failure while fetching an index file.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: Arc<std::io::Error>,
    },

    #[error("no index available for {0}")]
    Missing(MonthKey),
}

/// Malformed row in an index file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed index for {month} at line {line}: {kind}")]
pub struct ParseError {
    pub month: MonthKey,
    /// 1-based line number within the index file.
    pub line: usize,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("expected 4 tab-separated fields, found {0}")]
    FieldCount(usize),

    #[error("{field} '{value}' is not a bracketed {expected}-tuple")]
    Tuple {
        field: &'static str,
        value: String,
        expected: usize,
    },

    #[error("invalid image filename '{0}'")]
    Filename(String),

    #[error("'{filename}' does not belong to this month")]
    WrongMonth { filename: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_combines_issues() {
        let err = ValidationError::new(vec![
            ValidationIssue::StartBeforeEarliest {
                start: "20141118".into(),
                earliest: "20141119".into(),
            },
            ValidationIssue::InvalidEnd("2015".into()),
        ]);
        let msg = CatalogError::from(err).to_string();
        assert!(msg.contains("before the earliest available date 20141119"));
        assert!(msg.contains("end date '2015'"));
        assert!(msg.contains("; "));
    }

    #[test]
    fn test_kind_and_status() {
        let range = CatalogError::from(ValidationError::new(vec![ValidationIssue::StartAfterEnd {
            start: "20150102".into(),
            end: "20150101".into(),
        }]));
        assert_eq!(range.kind(), "RangeError");
        assert_eq!(range.http_status_code(), 400);

        let month: MonthKey = "201501".parse().unwrap();
        let fetch = CatalogError::Fetch {
            month,
            source: FetchError::Status {
                url: "http://x/data/201501/log.txt".into(),
                status: 500,
            },
        };
        assert_eq!(fetch.kind(), "FetchError");
        assert_eq!(fetch.http_status_code(), 502);

        let parse = CatalogError::from(ParseError {
            month,
            line: 3,
            kind: ParseErrorKind::FieldCount(2),
        });
        assert_eq!(parse.kind(), "ParseError");
        assert!(parse.to_string().contains("line 3"));
    }
}
