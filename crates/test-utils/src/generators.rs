//! Generators for synthetic month index files.
//!
//! These generators create predictable, verifiable index text that can be
//! used across the test suite.

/// Channels present in a typical month.
pub const ALL_CHANNELS: [&str; 5] = ["IR1", "IR2", "IR3", "IR4", "VIS"];

/// Creates a month of index rows.
///
/// One `FULL` row is emitted per day, hour and channel, in that nesting
/// order, so the total is `days * hours.len() * channels.len()`.
///
/// # Arguments
///
/// * `year`, `month` - Month to generate
/// * `days` - Number of days to cover, starting from the 1st
/// * `hours` - Hours of the day that have an image
/// * `channels` - Channel tokens to emit for each instant
///
/// # Example
///
/// ```
/// use test_utils::generate_month_index;
///
/// let text = generate_month_index(2015, 1, 2, &[0, 12], &["VIS"]);
/// assert_eq!(text.lines().count(), 4);
/// assert!(text.starts_with("201501010000.VIS.FULL.png"));
/// ```
pub fn generate_month_index(
    year: u32,
    month: u32,
    days: u32,
    hours: &[u32],
    channels: &[&str],
) -> String {
    let mut text = String::new();
    for day in 1..=days {
        for hour in hours {
            for channel in channels {
                text.push_str(&crate::index_row(
                    &format!("{:04}{:02}{:02}{:02}00", year, month, day, hour),
                    channel,
                    "FULL",
                ));
            }
        }
    }
    text
}

/// Same as [`generate_month_index`] but rows are emitted newest first.
pub fn generate_month_index_reversed(
    year: u32,
    month: u32,
    days: u32,
    hours: &[u32],
    channels: &[&str],
) -> String {
    let text = generate_month_index(year, month, days, hours, channels);
    let mut lines: Vec<&str> = text.lines().collect();
    lines.reverse();
    lines.iter().map(|l| format!("{}\n", l)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_counts() {
        let text = generate_month_index(2016, 2, 29, &[0, 6, 12, 18], &ALL_CHANNELS);
        assert_eq!(text.lines().count(), 29 * 4 * 5);
        assert!(text.contains("201602291800.VIS.FULL.png"));
    }

    #[test]
    fn test_reversed_order() {
        let text = generate_month_index_reversed(2015, 3, 2, &[0], &["IR1"]);
        let first = text.lines().next().unwrap();
        assert!(first.starts_with("201503020000"));
    }
}
