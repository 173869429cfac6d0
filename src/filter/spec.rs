//! Named-predicate filtering of a materialized dataset.
//!
//! A [`FilterSpec`] holds optional constraints. Each present constraint is
//! one predicate, predicates are ANDed, and `limit` truncates the surviving
//! sequence last. Filtering never reorders records.

use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use crate::model::record::EmailRecord;

/// How a domain pattern is compared against `from_domain`.
///
/// Chosen once per filter application, never per record.
#[derive(Debug, Clone)]
pub enum DomainMatcher {
    /// `*.suffix`: the domain must end with `suffix` (case-insensitive).
    Wildcard(String),
    /// A compiled regular expression, matched anywhere in the domain.
    Pattern(Regex),
    /// Case-insensitive equality; used when the pattern is not a valid regex.
    Literal(String),
}

impl DomainMatcher {
    /// Pick the matching strategy for a domain pattern.
    ///
    /// Never fails: a pattern that does not compile degrades to [`DomainMatcher::Literal`].
    pub fn new(pattern: &str) -> Self {
        if let Some(suffix) = pattern.strip_prefix("*.") {
            return Self::Wildcard(suffix.to_lowercase());
        }
        match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(re) => Self::Pattern(re),
            Err(e) => {
                warn!(pattern, error = %e, "Domain pattern is not a valid regex, using exact match");
                Self::Literal(pattern.to_lowercase())
            }
        }
    }

    /// Check a `from_domain` value.
    pub fn matches(&self, domain: &str) -> bool {
        match self {
            Self::Wildcard(suffix) => domain.to_lowercase().ends_with(suffix.as_str()),
            Self::Pattern(re) => re.is_match(domain),
            Self::Literal(expected) => domain.to_lowercase() == *expected,
        }
    }
}

/// Constraints for [`FilterSpec::apply`].
///
/// Absent fields impose no constraint. Setters normalize "falsy" input
/// (empty strings, a zero limit) to absence, so a spec is valid by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    domain: Option<String>,
    year: Option<String>,
    subject_contains: Option<String>,
    to_contains: Option<String>,
    folder_contains: Option<String>,
    date_after: Option<String>,
    date_before: Option<String>,
    has_body: bool,
    limit: Option<usize>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl FilterSpec {
    /// A spec with no constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sender domain: `*.suffix`, a regex, or a literal domain.
    pub fn domain(mut self, pattern: Option<String>) -> Self {
        self.domain = non_empty(pattern);
        self
    }

    /// Keep records whose `date` contains this text.
    ///
    /// This is a substring test, not a calendar comparison: `"201"` also
    /// matches `2017-…` and any date containing `201` elsewhere.
    pub fn year(mut self, year: Option<String>) -> Self {
        self.year = non_empty(year);
        self
    }

    /// Case-insensitive substring of `subject`.
    pub fn subject_contains(mut self, text: Option<String>) -> Self {
        self.subject_contains = non_empty(text).map(|t| t.to_lowercase());
        self
    }

    /// Case-insensitive substring of the raw `to` header.
    pub fn to_contains(mut self, text: Option<String>) -> Self {
        self.to_contains = non_empty(text).map(|t| t.to_lowercase());
        self
    }

    /// Case-insensitive substring of `folder`.
    pub fn folder_contains(mut self, text: Option<String>) -> Self {
        self.folder_contains = non_empty(text).map(|t| t.to_lowercase());
        self
    }

    /// Inclusive lower bound on `date`, compared as strings.
    pub fn date_after(mut self, date: Option<String>) -> Self {
        self.date_after = non_empty(date);
        self
    }

    /// Inclusive upper bound on `date`, compared as strings.
    pub fn date_before(mut self, date: Option<String>) -> Self {
        self.date_before = non_empty(date);
        self
    }

    /// Keep only records with a body when `true`.
    pub fn has_body(mut self, required: bool) -> Self {
        self.has_body = required;
        self
    }

    /// Keep at most `n` records. `0` means unlimited.
    pub fn limit(mut self, n: Option<usize>) -> Self {
        self.limit = n.filter(|&n| n > 0);
        self
    }

    /// Whether the spec imposes no constraint at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Return the records that satisfy every constraint, in input order.
    pub fn apply(&self, records: &[EmailRecord]) -> Vec<EmailRecord> {
        let matcher = self.domain.as_deref().map(DomainMatcher::new);
        debug!(?matcher, spec = ?self, "Applying filter");

        let survivors = records
            .iter()
            .filter(|rec| self.record_matches(rec, matcher.as_ref()))
            .cloned();

        match self.limit {
            Some(n) => survivors.take(n).collect(),
            None => survivors.collect(),
        }
    }

    /// Cheapest checks first; every check short-circuits.
    fn record_matches(&self, rec: &EmailRecord, matcher: Option<&DomainMatcher>) -> bool {
        if self.has_body && !rec.has_body {
            return false;
        }
        if let Some(ref after) = self.date_after {
            if rec.date.as_str() < after.as_str() {
                return false;
            }
        }
        if let Some(ref before) = self.date_before {
            if rec.date.as_str() > before.as_str() {
                return false;
            }
        }
        if let Some(ref year) = self.year {
            if !rec.date.contains(year.as_str()) {
                return false;
            }
        }
        if let Some(m) = matcher {
            if !m.matches(&rec.from_domain) {
                return false;
            }
        }
        contains_lower(&rec.subject, self.subject_contains.as_deref())
            && contains_lower(&rec.to, self.to_contains.as_deref())
            && contains_lower(&rec.folder, self.folder_contains.as_deref())
    }
}

/// `needle` is already lower-cased; `None` always matches.
fn contains_lower(haystack: &str, needle: Option<&str>) -> bool {
    match needle {
        Some(n) => haystack.to_lowercase().contains(n),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::record::RawMessage;

    fn make_record(from: &str, date: &str, subject: &str, body: &str) -> EmailRecord {
        EmailRecord::from_raw(RawMessage {
            message_id: Some(format!("{subject}@test")),
            date: Some(date.to_string()),
            from: Some(from.to_string()),
            to: Some("Me <me@home.net>".to_string()),
            subject: Some(subject.to_string()),
            body: Some(body.to_string()),
            folder: Some("mailbox://me/Inbox".to_string()),
        })
    }

    #[test]
    fn test_wildcard_is_suffix_match() {
        let m = DomainMatcher::new("*.edu");
        assert!(matches!(m, DomainMatcher::Wildcard(_)));
        assert!(m.matches("cs.wsu.edu"));
        assert!(m.matches("CS.WSU.EDU"));
        assert!(!m.matches("wsu.edu.com"));
    }

    #[test]
    fn test_regex_pattern_matches_anywhere() {
        let m = DomainMatcher::new(r"amazon\.(com|de)");
        assert!(matches!(m, DomainMatcher::Pattern(_)));
        assert!(m.matches("marketplace.amazon.de"));
        assert!(!m.matches("amazon.fr"));
    }

    #[test]
    fn test_invalid_regex_falls_back_to_literal() {
        let m = DomainMatcher::new("(");
        assert!(matches!(m, DomainMatcher::Literal(_)));
        assert!(m.matches("("));
        assert!(!m.matches("example.com"));

        let records = vec![make_record("a@b.com", "", "x", "")];
        let out = FilterSpec::new().domain(Some("(".to_string())).apply(&records);
        assert!(out.is_empty());
    }

    #[test]
    fn test_literal_fallback_is_case_insensitive() {
        let m = DomainMatcher::new("Weird[Domain");
        assert!(m.matches("weird[domain"));
    }

    #[test]
    fn test_limit_applies_after_predicates() {
        let mut records = Vec::new();
        for i in 0..100 {
            let from = if i % 10 == 0 {
                format!("n{i}@shop.edu")
            } else {
                format!("n{i}@other.com")
            };
            records.push(make_record(&from, "2024-01-01 00:00:00", &format!("s{i}"), ""));
        }
        let out = FilterSpec::new()
            .limit(Some(3))
            .domain(Some("*.edu".to_string()))
            .apply(&records);
        let subjects: Vec<&str> = out.iter().map(|r| r.subject.as_str()).collect();
        assert_eq!(subjects, vec!["s0", "s10", "s20"]);
    }

    #[test]
    fn test_year_is_substring_match() {
        let records = vec![
            make_record("a@x.com", "2017-03-01 10:00:00", "a", ""),
            make_record("a@x.com", "2020-01-01 10:00:00", "b", ""),
            make_record("a@x.com", "", "c", ""),
        ];
        let out = FilterSpec::new().year(Some("201".to_string())).apply(&records);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].subject, "a");

        let loose = FilterSpec::new().year(Some("1".to_string())).apply(&records);
        assert_eq!(loose.len(), 2);
    }

    #[test]
    fn test_subject_contains_case_insensitive() {
        let records = vec![
            make_record("a@x.com", "", "Your INVOICE", ""),
            make_record("a@x.com", "", "Hello", ""),
        ];
        let out = FilterSpec::new()
            .subject_contains(Some("invoice".to_string()))
            .apply(&records);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_has_body_and_combined_predicates() {
        let records = vec![
            make_record("a@shop.edu", "2024-01-01 00:00:00", "Sale", "buy now"),
            make_record("b@shop.edu", "2024-02-01 00:00:00", "Sale", ""),
            make_record("c@b.com", "2024-03-01 00:00:00", "Sale", "buy"),
        ];
        let out = FilterSpec::new()
            .has_body(true)
            .domain(Some("*.edu".to_string()))
            .subject_contains(Some("sale".to_string()))
            .apply(&records);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].from_domain, "shop.edu");
    }

    #[test]
    fn test_to_folder_and_date_bounds() {
        let mut records = vec![
            make_record("a@x.com", "2019-12-31 23:59:59", "a", ""),
            make_record("a@x.com", "2020-06-01 00:00:00", "b", ""),
            make_record("a@x.com", "2021-01-01 00:00:00", "c", ""),
        ];
        records[1].folder = "mailbox://me/Archive".to_string();

        let out = FilterSpec::new()
            .date_after(Some("2020-01-01".to_string()))
            .date_before(Some("2020-12-31".to_string()))
            .apply(&records);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].subject, "b");

        let archived = FilterSpec::new()
            .folder_contains(Some("archive".to_string()))
            .to_contains(Some("HOME.NET".to_string()))
            .apply(&records);
        assert_eq!(archived.len(), 1);
    }

    #[test]
    fn test_falsy_values_impose_no_constraint() {
        let spec = FilterSpec::new()
            .domain(Some(String::new()))
            .year(None)
            .subject_contains(Some(String::new()))
            .limit(Some(0));
        assert!(spec.is_empty());

        let records = vec![make_record("a@x.com", "", "a", ""); 4];
        assert_eq!(spec.apply(&records), records);
    }

    #[test]
    fn test_filtering_preserves_order_and_input() {
        let records = vec![
            make_record("a@keep.org", "", "1", ""),
            make_record("b@drop.org", "", "2", ""),
            make_record("c@keep.org", "", "3", ""),
        ];
        let before = records.clone();
        let out = FilterSpec::new()
            .domain(Some("keep.org".to_string()))
            .apply(&records);
        assert_eq!(records, before);
        let subjects: Vec<&str> = out.iter().map(|r| r.subject.as_str()).collect();
        assert_eq!(subjects, vec!["1", "3"]);
    }
}
