//! Regular-expression content queries over subject and body text.
//!
//! Unlike the filter's domain pattern, a content pattern must compile:
//! an invalid pattern is reported as [`TmError::MalformedPattern`].

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, TmError};
use crate::model::record::EmailRecord;
use crate::stats::percentage;

/// Pattern searched for when none is given.
pub const DEFAULT_PATTERN: &str = "unsubscribe";

/// A compiled content query.
#[derive(Debug, Clone)]
pub struct ContentQuery {
    pattern: String,
    regex: Regex,
}

impl ContentQuery {
    /// Compile `pattern`, case-insensitively unless `case_sensitive`.
    pub fn new(pattern: &str, case_sensitive: bool) -> Result<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|e| TmError::pattern(pattern, e))?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// The pattern as given by the operator.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Match in the subject.
    pub fn matches_subject(&self, record: &EmailRecord) -> bool {
        self.regex.is_match(&record.subject)
    }

    /// Match in the body. Records without a body never match, whatever
    /// stale text `body` may hold.
    pub fn matches_body(&self, record: &EmailRecord) -> bool {
        record.has_body && self.regex.is_match(&record.body)
    }

    /// Match in the subject or, if present, the body.
    pub fn matches(&self, record: &EmailRecord) -> bool {
        self.matches_subject(record) || self.matches_body(record)
    }

    /// Return the matching records in input order.
    pub fn select(&self, records: &[EmailRecord]) -> Vec<EmailRecord> {
        let hits: Vec<EmailRecord> = records.iter().filter(|r| self.matches(r)).cloned().collect();
        debug!(
            pattern = %self.pattern,
            total = records.len(),
            matched = hits.len(),
            "Content query finished"
        );
        hits
    }

    /// Count subject and body hits across the dataset.
    pub fn report(&self, records: &[EmailRecord]) -> ContentReport {
        let mut report = ContentReport {
            pattern: self.pattern.clone(),
            total: records.len(),
            ..Default::default()
        };
        for record in records {
            if record.has_body {
                report.with_body += 1;
            }
            if self.matches_subject(record) {
                report.subject_matches += 1;
            }
            if self.matches_body(record) {
                report.body_matches += 1;
            }
        }
        report
    }
}

/// Hit counts for one pattern.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContentReport {
    pub pattern: String,
    pub total: usize,
    pub with_body: usize,
    pub subject_matches: usize,
    /// Counted only among records with a body.
    pub body_matches: usize,
}

impl ContentReport {
    /// Subject hits as a percentage of all records (0 for an empty dataset).
    pub fn subject_percentage(&self) -> f64 {
        percentage(self.subject_matches, self.total)
    }

    /// Body hits as a percentage of records with a body.
    pub fn body_percentage(&self) -> f64 {
        percentage(self.body_matches, self.with_body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::record::RawMessage;

    fn record(subject: &str, body: &str) -> EmailRecord {
        EmailRecord::from_raw(RawMessage {
            subject: Some(subject.to_string()),
            body: Some(body.to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let err = ContentQuery::new("(unclosed", false).unwrap_err();
        assert!(matches!(err, TmError::MalformedPattern { .. }));
    }

    #[test]
    fn test_matches_subject_or_body() {
        let q = ContentQuery::new("unsubscribe", false).unwrap();
        assert!(q.matches(&record("Please UNSUBSCRIBE me", "")));
        assert!(q.matches(&record("Weekly news", "click to unsubscribe")));
        assert!(!q.matches(&record("hello", "")));
    }

    #[test]
    fn test_case_sensitivity_flag() {
        let q = ContentQuery::new("Invoice", true).unwrap();
        assert!(q.matches(&record("Invoice #12", "")));
        assert!(!q.matches(&record("invoice #12", "")));
    }

    #[test]
    fn test_stale_body_ignored_without_has_body() {
        let mut rec = record("hello", "");
        rec.body = "unsubscribe here".to_string();
        assert!(!rec.has_body);
        let q = ContentQuery::new("unsubscribe", false).unwrap();
        assert!(!q.matches(&rec));
    }

    #[test]
    fn test_select_preserves_order() {
        let records = vec![
            record("sale 1", ""),
            record("hello", ""),
            record("sale 2", ""),
        ];
        let q = ContentQuery::new(r"sale \d", false).unwrap();
        let hits = q.select(&records);
        let subjects: Vec<&str> = hits.iter().map(|r| r.subject.as_str()).collect();
        assert_eq!(subjects, vec!["sale 1", "sale 2"]);
    }

    #[test]
    fn test_report_counts_and_percentages() {
        let records = vec![
            record("unsubscribe now", "unsubscribe"),
            record("hello", "no match"),
            record("hi", ""),
            record("bye", ""),
        ];
        let report = ContentQuery::new("unsubscribe", false)
            .unwrap()
            .report(&records);
        assert_eq!(report.total, 4);
        assert_eq!(report.with_body, 2);
        assert_eq!(report.subject_matches, 1);
        assert_eq!(report.body_matches, 1);
        assert!((report.subject_percentage() - 25.0).abs() < f64::EPSILON);
        assert!((report.body_percentage() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_report_on_empty_dataset() {
        let report = ContentQuery::new("x", false).unwrap().report(&[]);
        assert_eq!(report.subject_percentage(), 0.0);
        assert_eq!(report.body_percentage(), 0.0);
    }
}
