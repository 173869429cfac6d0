//! Aggregations over a record sequence: temporal buckets, spam keywords,
//! and sender-domain statistics.
//!
//! Temporal aggregations silently skip records whose `date` does not parse.

pub mod domains;
pub mod keywords;
pub mod temporal;

use chrono::NaiveDateTime;

/// Layout of the dataset `date` field.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse the leading `YYYY-MM-DD HH:MM:SS` of a record date.
///
/// Anything after the first 19 characters is ignored. Returns `None` for
/// empty or malformed dates.
pub fn parse_record_date(date: &str) -> Option<NaiveDateTime> {
    let head = match date.char_indices().nth(19) {
        Some((idx, _)) => &date[..idx],
        None => date,
    };
    NaiveDateTime::parse_from_str(head, DATE_FORMAT).ok()
}

/// `part / whole * 100`, or 0 when `whole` is 0.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
