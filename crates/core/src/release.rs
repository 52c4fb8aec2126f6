//! Calendar-based release versioning.
//!
//! Release tags follow a `YY.M.index` scheme: two-digit year, month
//! number, and a counter that increments within the month and resets when
//! the month rolls over.

use chrono::{Datelike, NaiveDate};

/// Determine the next release version given the existing tag names.
///
/// Tags that do not parse as three dot-separated integers are ignored, so
/// unrelated tags in the repository are harmless. Pure over `today` for
/// testability.
pub fn next_version(existing_tags: &[String], today: NaiveDate) -> String {
    let year = today.year() % 100;
    let month = today.month();

    let mut versions: Vec<(u32, u32, u32)> = existing_tags
        .iter()
        .filter_map(|tag| parse_version(tag))
        .collect();
    versions.sort_unstable();

    let index = match versions.last() {
        Some(&(tag_year, tag_month, tag_index))
            if tag_year == year as u32 && tag_month == month =>
        {
            tag_index + 1
        }
        _ => 0,
    };

    format!("{}.{}.{}", year, month, index)
}

fn parse_version(tag: &str) -> Option<(u32, u32, u32)> {
    let mut parts = tag.split('.');
    let year = parts.next()?.parse().ok()?;
    let month = parts.next()?.parse().ok()?;
    let index = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((year, month, index))
}
