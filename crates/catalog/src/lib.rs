//! Date-indexed catalog engine for satellite imagery.
//!
//! Provides:
//! - Parsing of monthly `log.txt` index files
//! - A per-month index cache with single-flight loading
//! - Date range validation and channel filtering
//! - `CatalogService`, the query entry point used by front ends

pub mod cache;
pub mod config;
pub mod filter;
pub mod parser;
pub mod service;
pub mod source;
pub mod validation;

pub use cache::{CacheStats, IndexCache, IndexCacheEntry};
pub use config::{CatalogConfig, ConfigError, DEFAULT_EARLIEST_DATE};
pub use filter::{filter_records, sort_by_timestamp};
pub use parser::parse_index;
pub use service::{CatalogQuery, CatalogService};
pub use source::{create_source, HttpIndexSource, IndexSource, MemoryIndexSource, MirrorIndexSource};
pub use validation::{DateRange, DateRangeValidator};
