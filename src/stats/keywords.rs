//! Spam-keyword frequency over time.
//!
//! Each record's `subject + " " + body` is tested against a named set of
//! case-insensitive patterns. Per month and per year bucket we count the
//! records matching at least one pattern (once per record) and, separately,
//! how many records matched each individual pattern.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Datelike;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::debug;

use super::{parse_record_date, percentage};
use crate::error::{Result, TmError};
use crate::model::record::EmailRecord;

/// Built-in marketing/spam patterns.
pub const DEFAULT_KEYWORDS: [(&str, &str); 7] = [
    ("survey", r"\b(survey|questionnaire|feedback|review)\b"),
    ("rate_us", r"\b(rate\s+us|rating|review\s+us|tell\s+us\s+what)\b"),
    (
        "take_minutes",
        r"\b(take\s+\d+\s+minutes?|quick\s+survey|brief\s+survey)\b",
    ),
    (
        "satisfaction",
        r"\b(satisfaction|experience|service|how\s+did\s+we\s+do)\b",
    ),
    (
        "win_prizes",
        r"\b(win|prize|reward|gift\s+card|enter\s+to\s+win)\b",
    ),
    (
        "limited_time",
        r"\b(limited\s+time|expires|hurry|act\s+now|don't\s+miss)\b",
    ),
    (
        "unsubscribe_bait",
        r"\b(unsubscribe|opt\s+out|remove|preferences)\b",
    ),
];

/// One named pattern.
#[derive(Debug, Clone)]
struct Keyword {
    name: String,
    source: String,
    regex: Regex,
}

impl Keyword {
    fn new(name: &str, pattern: &str) -> Result<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| TmError::pattern(pattern, e))?;
        Ok(Self {
            name: name.to_string(),
            source: pattern.to_string(),
            regex,
        })
    }
}

/// An ordered set of named patterns.
#[derive(Debug, Clone)]
pub struct KeywordSet {
    keywords: Vec<Keyword>,
}

impl KeywordSet {
    /// Build a set from `(name, pattern)` pairs.
    pub fn new<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        let keywords = pairs
            .into_iter()
            .map(|(name, pattern)| Keyword::new(name, pattern))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { keywords })
    }

    /// The built-in set.
    pub fn defaults() -> Result<Self> {
        Self::new(DEFAULT_KEYWORDS)
    }

    /// Replace patterns with the same name, append new ones.
    pub fn merge(&mut self, overrides: &BTreeMap<String, String>) -> Result<()> {
        for (name, pattern) in overrides {
            let keyword = Keyword::new(name, pattern)?;
            match self.keywords.iter_mut().find(|k| k.name == *name) {
                Some(existing) => *existing = keyword,
                None => self.keywords.push(keyword),
            }
        }
        Ok(())
    }

    /// Merge overrides read from a JSON object file (`{"name": "pattern"}`).
    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| TmError::io(path, e))?;
        let overrides: BTreeMap<String, String> = serde_json::from_str(&contents)?;
        debug!(path = %path.display(), count = overrides.len(), "Loaded keyword overrides");
        self.merge(&overrides)
    }

    /// Names of the patterns matching `text`, in set order.
    pub fn matching<'s>(&'s self, text: &str) -> Vec<&'s str> {
        self.keywords
            .iter()
            .filter(|k| k.regex.is_match(text))
            .map(|k| k.name.as_str())
            .collect()
    }

    /// `name → pattern` for reporting.
    pub fn patterns(&self) -> BTreeMap<String, String> {
        self.keywords
            .iter()
            .map(|k| (k.name.clone(), k.source.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

/// Counters for one time bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeywordBucket {
    pub total_emails: usize,
    pub spam_emails: usize,
    pub keyword_matches: BTreeMap<String, usize>,
    pub spam_percentage: f64,
}

impl KeywordBucket {
    fn add(&mut self, matched: &[&str]) {
        self.total_emails += 1;
        if !matched.is_empty() {
            self.spam_emails += 1;
            for name in matched {
                *self.keyword_matches.entry((*name).to_string()).or_default() += 1;
            }
        }
    }

    fn finish(&mut self) {
        self.spam_percentage = percentage(self.spam_emails, self.total_emails);
    }
}

/// Totals across the whole dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordSummary {
    pub total_emails_analyzed: usize,
    pub total_spam_emails: usize,
    pub overall_spam_percentage: f64,
    pub keyword_patterns: BTreeMap<String, String>,
}

/// Full keyword analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordReport {
    pub summary: KeywordSummary,
    /// Keyed by `YYYY-MM`.
    pub by_month: BTreeMap<String, KeywordBucket>,
    pub by_year: BTreeMap<i32, KeywordBucket>,
}

impl KeywordReport {
    /// Years ordered by spam share (highest first) having more than
    /// `min_total` emails.
    pub fn top_spam_years(&self, n: usize, min_total: usize) -> Vec<(i32, &KeywordBucket)> {
        let mut years: Vec<(i32, &KeywordBucket)> = self
            .by_year
            .iter()
            .map(|(y, b)| (*y, b))
            .filter(|(_, b)| b.total_emails > min_total)
            .collect();
        years.sort_by(|a, b| b.1.spam_percentage.total_cmp(&a.1.spam_percentage));
        years.truncate(n);
        years
    }
}

/// Run the keyword analysis. Records with an unparseable date are skipped.
pub fn analyze(records: &[EmailRecord], keywords: &KeywordSet) -> KeywordReport {
    let mut by_month: BTreeMap<String, KeywordBucket> = BTreeMap::new();
    let mut by_year: BTreeMap<i32, KeywordBucket> = BTreeMap::new();
    let mut processed = 0usize;
    let mut spam = 0usize;

    for record in records {
        let Some(dt) = parse_record_date(&record.date) else {
            continue;
        };
        let text = format!("{} {}", record.subject, record.body);
        let matched = keywords.matching(&text);

        processed += 1;
        if !matched.is_empty() {
            spam += 1;
        }

        let month_key = format!("{}-{:02}", dt.year(), dt.month());
        by_month.entry(month_key).or_default().add(&matched);
        by_year.entry(dt.year()).or_default().add(&matched);
    }

    by_month.values_mut().for_each(KeywordBucket::finish);
    by_year.values_mut().for_each(KeywordBucket::finish);

    KeywordReport {
        summary: KeywordSummary {
            total_emails_analyzed: processed,
            total_spam_emails: spam,
            overall_spam_percentage: percentage(spam, processed),
            keyword_patterns: keywords.patterns(),
        },
        by_month,
        by_year,
    }
}
