//! Grouping by year, month, weekday, hour or sender domain.
//!
//! Buckets live in an ordered map keyed by [`BucketKey`], so iteration order
//! is the natural order of the key (chronological, Monday-first, 0–23, or
//! alphabetical for domains). Buckets are created on first use with zero
//! counts; a key that never appears simply has no bucket.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;

use super::{parse_record_date, percentage};
use crate::model::record::EmailRecord;

/// Weekday labels, Monday first.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// What to group records by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    Year,
    /// `YYYY-MM` buckets, optionally restricted to one year.
    Month { year: Option<i32> },
    Weekday,
    Hour,
    Domain,
}

/// Canonical bucket identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BucketKey {
    Year(i32),
    Month(i32, u32),
    /// Days from Monday (0–6).
    Weekday(u32),
    Hour(u32),
    Domain(String),
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Year(y) => write!(f, "{y}"),
            Self::Month(y, m) => write!(f, "{y}-{m:02}"),
            Self::Weekday(d) => f.write_str(WEEKDAY_NAMES[*d as usize % 7]),
            Self::Hour(h) => write!(f, "{h}"),
            Self::Domain(d) => f.write_str(d),
        }
    }
}

/// Per-bucket counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bucket {
    pub total: usize,
    pub with_body: usize,
}

impl Bucket {
    fn add(&mut self, record: &EmailRecord) {
        self.total += 1;
        if record.has_body {
            self.with_body += 1;
        }
    }

    /// Share of records with a body; 0 for an empty bucket.
    pub fn body_percentage(&self) -> f64 {
        percentage(self.with_body, self.total)
    }
}

/// Flattened bucket for serialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketRow {
    pub bucket: String,
    pub total_emails: usize,
    pub emails_with_body: usize,
    pub body_percentage: f64,
}

impl BucketRow {
    fn new(key: &BucketKey, bucket: &Bucket) -> Self {
        Self {
            bucket: key.to_string(),
            total_emails: bucket.total,
            emails_with_body: bucket.with_body,
            body_percentage: bucket.body_percentage(),
        }
    }
}

fn temporal_key(grouping: Grouping, dt: &NaiveDateTime) -> Option<BucketKey> {
    match grouping {
        Grouping::Year => Some(BucketKey::Year(dt.year())),
        Grouping::Month { year } => match year {
            Some(y) if y != dt.year() => None,
            _ => Some(BucketKey::Month(dt.year(), dt.month())),
        },
        Grouping::Weekday => Some(BucketKey::Weekday(dt.weekday().num_days_from_monday())),
        Grouping::Hour => Some(BucketKey::Hour(dt.hour())),
        Grouping::Domain => None,
    }
}

/// Group records into buckets.
///
/// Temporal groupings drop records with an unparseable date.
pub fn group(records: &[EmailRecord], grouping: Grouping) -> BTreeMap<BucketKey, Bucket> {
    let mut buckets: BTreeMap<BucketKey, Bucket> = BTreeMap::new();
    for record in records {
        let key = match grouping {
            Grouping::Domain => Some(BucketKey::Domain(record.from_domain.clone())),
            _ => parse_record_date(&record.date).and_then(|dt| temporal_key(grouping, &dt)),
        };
        if let Some(key) = key {
            buckets.entry(key).or_default().add(record);
        }
    }
    buckets
}

/// Group records and flatten the buckets in key order.
pub fn group_rows(records: &[EmailRecord], grouping: Grouping) -> Vec<BucketRow> {
    group(records, grouping)
        .iter()
        .map(|(key, bucket)| BucketRow::new(key, bucket))
        .collect()
}

/// Oldest and newest parseable dates, ISO 8601.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Overview used when no specific grouping is requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalSummary {
    pub total_emails: usize,
    pub emails_with_body: usize,
    pub date_range: Option<DateRange>,
    pub by_year: Vec<BucketRow>,
    pub by_weekday: Vec<BucketRow>,
}

impl TemporalSummary {
    /// Years sorted by volume, busiest first (ties: earlier year first).
    pub fn busiest_years(&self, n: usize) -> Vec<&BucketRow> {
        let mut years: Vec<&BucketRow> = self.by_year.iter().collect();
        years.sort_by(|a, b| b.total_emails.cmp(&a.total_emails));
        years.truncate(n);
        years
    }
}

/// Build the temporal overview of a dataset.
pub fn summarize(records: &[EmailRecord]) -> TemporalSummary {
    let dates: Vec<NaiveDateTime> = records
        .iter()
        .filter_map(|r| parse_record_date(&r.date))
        .collect();
    let date_range = match (dates.iter().min(), dates.iter().max()) {
        (Some(min), Some(max)) => Some(DateRange {
            start: min.format("%Y-%m-%dT%H:%M:%S").to_string(),
            end: max.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }),
        _ => None,
    };

    TemporalSummary {
        total_emails: records.len(),
        emails_with_body: records.iter().filter(|r| r.has_body).count(),
        date_range,
        by_year: group_rows(records, Grouping::Year),
        by_weekday: group_rows(records, Grouping::Weekday),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::record::RawMessage;

    fn record(date: &str, from: &str, body: &str) -> EmailRecord {
        EmailRecord::from_raw(RawMessage {
            date: Some(date.to_string()),
            from: Some(from.to_string()),
            body: Some(body.to_string()),
            ..Default::default()
        })
    }

    fn sample() -> Vec<EmailRecord> {
        vec![
            // Monday
            record("2024-01-01 09:15:00", "a@x.com", "body"),
            // Wednesday
            record("2024-01-03 18:00:00", "b@y.com", ""),
            // Sunday
            record("2023-12-31 09:45:00", "c@x.com", "body"),
            record("", "d@x.com", "body"),
            record("garbage", "e@z.com", ""),
        ]
    }

    #[test]
    fn test_group_by_year_skips_unparseable() {
        let rows = group_rows(&sample(), Grouping::Year);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].bucket, "2023");
        assert_eq!(rows[1].bucket, "2024");
        assert_eq!(rows[1].total_emails, 2);
        assert_eq!(rows[1].emails_with_body, 1);
        assert!((rows[1].body_percentage - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_group_by_month_with_year_restriction() {
        let all = group_rows(&sample(), Grouping::Month { year: None });
        let keys: Vec<&str> = all.iter().map(|r| r.bucket.as_str()).collect();
        assert_eq!(keys, vec!["2023-12", "2024-01"]);

        let only = group_rows(&sample(), Grouping::Month { year: Some(2023) });
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].bucket, "2023-12");
    }

    #[test]
    fn test_group_by_weekday_is_monday_first() {
        let rows = group_rows(&sample(), Grouping::Weekday);
        let keys: Vec<&str> = rows.iter().map(|r| r.bucket.as_str()).collect();
        assert_eq!(keys, vec!["Monday", "Wednesday", "Sunday"]);
    }

    #[test]
    fn test_group_by_hour() {
        let buckets = group(&sample(), Grouping::Hour);
        assert_eq!(buckets.get(&BucketKey::Hour(9)).map(|b| b.total), Some(2));
        assert_eq!(buckets.get(&BucketKey::Hour(18)).map(|b| b.total), Some(1));
    }

    #[test]
    fn test_group_by_domain_keeps_undated_records() {
        let buckets = group(&sample(), Grouping::Domain);
        assert_eq!(
            buckets.get(&BucketKey::Domain("x.com".into())),
            Some(&Bucket {
                total: 3,
                with_body: 3
            })
        );
        assert_eq!(buckets.values().map(|b| b.total).sum::<usize>(), 5);
    }

    #[test]
    fn test_empty_bucket_reports_zero_percent() {
        assert_eq!(Bucket::default().body_percentage(), 0.0);
    }

    #[test]
    fn test_summary() {
        let summary = summarize(&sample());
        assert_eq!(summary.total_emails, 5);
        assert_eq!(summary.emails_with_body, 3);
        let range = summary.date_range.clone().unwrap();
        assert_eq!(range.start, "2023-12-31T09:45:00");
        assert_eq!(range.end, "2024-01-03T18:00:00");
        assert_eq!(summary.busiest_years(1)[0].bucket, "2024");
    }

    #[test]
    fn test_summary_of_empty_dataset() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_emails, 0);
        assert!(summary.date_range.is_none());
        assert!(summary.by_year.is_empty());
    }
}
