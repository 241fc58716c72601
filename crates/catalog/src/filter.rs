//! Date-range and channel filtering over catalog records.

use std::sync::Arc;

use catalog_common::{compare_timestamps, timestamp_ordering, Channel, DateValue, IndexRecord};

/// Records dated within `[start, end]` on `channel`, oldest first.
///
/// The sort is stable, so records with equal timestamps keep their
/// incoming order.
pub fn filter_records(
    records: &[Arc<IndexRecord>],
    start: &DateValue,
    end: &DateValue,
    channel: Channel,
) -> Vec<Arc<IndexRecord>> {
    let start = start.date_string();
    let end = end.date_string();

    let mut matched: Vec<Arc<IndexRecord>> = records
        .iter()
        .filter(|r| {
            r.channel() == channel
                && compare_timestamps(&start, r.date())
                && compare_timestamps(r.date(), &end)
        })
        .cloned()
        .collect();

    sort_by_timestamp(&mut matched);
    matched
}

/// Stable ascending sort by timestamp.
pub fn sort_by_timestamp(records: &mut [Arc<IndexRecord>]) {
    records.sort_by(|a, b| timestamp_ordering(a.timestamp(), b.timestamp()));
}
