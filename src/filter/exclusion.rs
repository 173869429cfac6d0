//! Coarse exclusion rules loaded from the configuration file.
//!
//! Evaluated per record during bulk extraction. Rules are checked in a
//! fixed order and the first rule that fires excludes the record:
//!
//! 1. `ignore_from_domains` (exact or `*.suffix`)
//! 2. `include_from_domains`, when non-empty: no pattern matched
//! 3. `ignore_to_domains` (substring of the raw `to` header)
//! 4. `ignore_folders` (substring of the folder path)
//! 5. `date` before `date_after` or after `date_before` (string comparison)

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::record::EmailRecord;

/// Exclusion rules (the `[filters]` table of the configuration).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionFilters {
    /// Sender domains to drop.
    #[serde(alias = "ignore_domains")]
    pub ignore_from_domains: Vec<String>,
    /// If non-empty, only senders matching one of these survive.
    #[serde(alias = "include_domains")]
    pub include_from_domains: Vec<String>,
    /// Recipient fragments to drop.
    pub ignore_to_domains: Vec<String>,
    /// Folder path fragments to drop.
    pub ignore_folders: Vec<String>,
    /// Drop records dated before this (lexicographic).
    pub date_after: Option<String>,
    /// Drop records dated after this (lexicographic).
    pub date_before: Option<String>,
}

/// Exact (case-insensitive) or `*.suffix` domain comparison.
fn domain_rule_matches(domain: &str, rule: &str) -> bool {
    match rule.strip_prefix("*.") {
        Some(suffix) => domain.ends_with(&suffix.to_lowercase()),
        None => domain == rule.to_lowercase(),
    }
}

impl ExclusionFilters {
    /// Whether no rule is configured.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Decide whether a record is excluded.
    pub fn should_exclude(&self, record: &EmailRecord) -> bool {
        let domain = record.from_domain.to_lowercase();

        if self
            .ignore_from_domains
            .iter()
            .any(|rule| domain_rule_matches(&domain, rule))
        {
            return true;
        }

        if !self.include_from_domains.is_empty()
            && !self
                .include_from_domains
                .iter()
                .any(|rule| domain_rule_matches(&domain, rule))
        {
            return true;
        }

        if !self.ignore_to_domains.is_empty() {
            let to = record.to.to_lowercase();
            if self
                .ignore_to_domains
                .iter()
                .any(|frag| to.contains(&frag.to_lowercase()))
            {
                return true;
            }
        }

        if !self.ignore_folders.is_empty() {
            let folder = record.folder.to_lowercase();
            if self
                .ignore_folders
                .iter()
                .any(|frag| folder.contains(&frag.to_lowercase()))
            {
                return true;
            }
        }

        if let Some(after) = self.date_after.as_deref().filter(|d| !d.is_empty()) {
            if record.date.as_str() < after {
                return true;
            }
        }
        if let Some(before) = self.date_before.as_deref().filter(|d| !d.is_empty()) {
            if record.date.as_str() > before {
                return true;
            }
        }

        false
    }

    /// Return the records that survive every rule, in input order.
    pub fn retain(&self, records: &[EmailRecord]) -> Vec<EmailRecord> {
        let kept: Vec<EmailRecord> = records
            .iter()
            .filter(|r| !self.should_exclude(r))
            .cloned()
            .collect();
        debug!(
            input = records.len(),
            kept = kept.len(),
            "Applied exclusion filters"
        );
        kept
    }
}
