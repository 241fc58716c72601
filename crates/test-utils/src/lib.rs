//! Shared test utilities for the satellite catalog workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Index file rows and scenario fixtures
//! - Generators for whole months of index text
//! - Temporary on-disk mirrors laid out like the image host
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, index_row, MirrorFixture};
//! ```

pub mod fixtures;
pub mod generators;
pub mod mirror;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
pub use mirror::*;

/// Assert that a sequence of records is sorted ascending by `timestamp`.
///
/// Works on any iterable whose items have a `timestamp()` method
/// returning `&str`.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_timestamps_ascending;
///
/// assert_timestamps_ascending!(records);
/// ```
#[macro_export]
macro_rules! assert_timestamps_ascending {
    ($records:expr) => {{
        let records = &$records;
        let stamps: Vec<&str> = records.iter().map(|r| r.timestamp()).collect();
        for pair in stamps.windows(2) {
            if pair[0] > pair[1] {
                panic!(
                    "assertion failed: timestamps not ascending: `{}` before `{}`",
                    pair[0], pair[1]
                );
            }
        }
    }};
}
