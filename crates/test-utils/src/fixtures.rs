//! Common test fixtures for catalog tests.
//!
//! This module provides pre-defined index rows and dates that represent
//! common scenarios in catalog queries.

/// Individual index rows, newline terminated.
pub mod rows {
    /// Full-disk visible image on the first day of 2015.
    pub const VIS_FULL_20150101: &str = "201501010000.VIS.FULL.png\tX\t[0,0,100,100]\t[0,255]\n";

    /// IR1 full-disk image at the same instant as [`VIS_FULL_20150101`].
    pub const IR1_FULL_20150101: &str = "201501010000.IR1.FULL.png\tX\t[0,0,100,100]\t[0,255]\n";

    /// Northern-hemisphere IR4 crop.
    pub const IR4_NORTH_20150115: &str =
        "201501151230.IR4.NORTH.png\tlabel\t[0,0,2750,1375]\t[-80.5,40.2]\n";

    /// Row with only three fields.
    pub const MISSING_FIELD: &str = "201501010010.VIS.FULL.png\t[0,0,100,100]\t[0,255]\n";

    /// Row whose range tuple lacks brackets.
    pub const UNBRACKETED_RANGE: &str = "201501010020.VIS.FULL.png\tX\t0,0,100,100\t[0,255]\n";
}

/// Dates around the archive's boundaries.
pub mod dates {
    /// First date with imagery.
    pub const EARLIEST: &str = "20141119";

    /// The day before [`EARLIEST`].
    pub const DAY_BEFORE_EARLIEST: &str = "20141118";

    /// A leap day inside the archive.
    pub const LEAP_DAY: &str = "20160229";

    /// A day that does not exist.
    pub const NON_LEAP_DAY: &str = "20150229";
}

/// Build one index row for `timestamp`, `channel` and `scope`.
///
/// # Example
///
/// ```
/// use test_utils::index_row;
///
/// assert_eq!(
///     index_row("201501010000", "VIS", "FULL"),
///     "201501010000.VIS.FULL.png\t-\t[0,0,100,100]\t[0,255]\n"
/// );
/// ```
pub fn index_row(timestamp: &str, channel: &str, scope: &str) -> String {
    format!(
        "{}.{}.{}.png\t-\t[0,0,100,100]\t[0,255]\n",
        timestamp, channel, scope
    )
}

/// Concatenate rows into one index file body.
pub fn index_text<I, S>(rows: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    rows.into_iter().fold(String::new(), |mut acc, row| {
        acc.push_str(row.as_ref());
        acc
    })
}
