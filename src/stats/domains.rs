//! Dataset statistics and sender-domain concentration.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use super::percentage;
use crate::model::record::EmailRecord;

/// One sender domain and its message count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainCount {
    pub domain: String,
    pub count: usize,
}

/// Count records per domain, busiest first (ties alphabetical).
pub fn domain_counts(records: &[EmailRecord]) -> Vec<DomainCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.from_domain.as_str()).or_default() += 1;
    }
    let mut sorted: Vec<DomainCount> = counts
        .into_iter()
        .map(|(domain, count)| DomainCount {
            domain: domain.to_string(),
            count,
        })
        .collect();
    sorted.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.domain.cmp(&b.domain)));
    sorted
}

/// The `n` busiest sender domains.
pub fn top_domains(records: &[EmailRecord], n: usize) -> Vec<DomainCount> {
    let mut counts = domain_counts(records);
    counts.truncate(n);
    counts
}

/// Lexicographically smallest and largest non-empty dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateSpan {
    pub oldest: String,
    pub newest: String,
}

/// Summary printed by `tm stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetStats {
    pub total: usize,
    pub with_body: usize,
    pub unique_domains: usize,
    pub date_range: Option<DateSpan>,
    pub top_domains: Vec<DomainCount>,
}

/// Number of domains listed in [`DatasetStats::top_domains`].
pub const TOP_DOMAINS: usize = 10;

/// Compute the dataset summary.
pub fn dataset_stats(records: &[EmailRecord]) -> DatasetStats {
    let counts = domain_counts(records);
    let dates = records
        .iter()
        .map(|r| r.date.as_str())
        .filter(|d| !d.is_empty());
    let date_range = match (dates.clone().min(), dates.max()) {
        (Some(oldest), Some(newest)) => Some(DateSpan {
            oldest: oldest.to_string(),
            newest: newest.to_string(),
        }),
        _ => None,
    };

    DatasetStats {
        total: records.len(),
        with_body: records.iter().filter(|r| r.has_body).count(),
        unique_domains: counts.len(),
        date_range,
        top_domains: counts.into_iter().take(TOP_DOMAINS).collect(),
    }
}

/// A domain's share of a record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainShare {
    pub domain: String,
    pub count: usize,
    /// Share of the set, 0–100.
    pub percentage: f64,
    /// Running share including this domain, 0–1.
    pub cumulative_percentage: f64,
}

/// Smallest prefix of busiest domains reaching `threshold` (0–1) coverage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainCoverage {
    pub total_emails: usize,
    pub coverage_threshold: f64,
    /// Coverage actually reached, 0–1.
    pub actual_coverage: f64,
    pub top_domains: Vec<DomainShare>,
}

fn fraction(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Walk domains by descending count until their cumulative share reaches `threshold`.
pub fn domain_coverage(records: &[EmailRecord], threshold: f64) -> DomainCoverage {
    let total = records.len();
    let mut cumulative = 0usize;
    let mut top = Vec::new();

    for DomainCount { domain, count } in domain_counts(records) {
        cumulative += count;
        let cumulative_share = fraction(cumulative, total);
        top.push(DomainShare {
            domain,
            count,
            percentage: percentage(count, total),
            cumulative_percentage: cumulative_share,
        });
        if cumulative_share >= threshold {
            break;
        }
    }

    DomainCoverage {
        total_emails: total,
        coverage_threshold: threshold,
        actual_coverage: fraction(cumulative, total),
        top_domains: top,
    }
}

/// Domain-set comparison between pattern matches and a filtered subset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainComparison {
    pub pattern_analysis: DomainCoverage,
    pub comparison_total: usize,
    pub comparison_domains: Vec<String>,
    /// Domains present in both the coverage prefix and the comparison set.
    pub overlap: Vec<String>,
}

/// Compare the covering domains of `matches` with the domains of `comparison`.
pub fn compare_domains(
    matches: &[EmailRecord],
    comparison: &[EmailRecord],
    threshold: f64,
) -> DomainComparison {
    let coverage = domain_coverage(matches, threshold);
    let compare_set: BTreeSet<&str> = comparison.iter().map(|r| r.from_domain.as_str()).collect();
    let overlap = coverage
        .top_domains
        .iter()
        .filter(|d| compare_set.contains(d.domain.as_str()))
        .map(|d| d.domain.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    DomainComparison {
        pattern_analysis: coverage,
        comparison_total: comparison.len(),
        comparison_domains: compare_set.into_iter().map(str::to_string).collect(),
        overlap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::record::RawMessage;

    fn record(from: &str, date: &str, body: &str) -> EmailRecord {
        EmailRecord::from_raw(RawMessage {
            from: Some(from.to_string()),
            date: Some(date.to_string()),
            body: Some(body.to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_dataset_stats_counts_malformed_domain() {
        let records = vec![
            record("news@shop.edu", "2024-01-02 00:00:00", "unsubscribe"),
            record("a@b.com", "2023-05-01 00:00:00", ""),
            record("garbage", "", ""),
        ];
        let stats = dataset_stats(&records);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.with_body, 1);
        assert_eq!(stats.unique_domains, 3);
        assert!(stats.top_domains.iter().any(|d| d.domain == "malformed"));
        assert_eq!(
            stats.date_range,
            Some(DateSpan {
                oldest: "2023-05-01 00:00:00".into(),
                newest: "2024-01-02 00:00:00".into(),
            })
        );
    }

    #[test]
    fn test_dataset_stats_empty() {
        let stats = dataset_stats(&[]);
        assert_eq!(stats.total, 0);
        assert!(stats.date_range.is_none());
        assert!(stats.top_domains.is_empty());
    }

    #[test]
    fn test_top_domains_order_and_limit() {
        let mut records = Vec::new();
        for _ in 0..3 {
            records.push(record("a@big.com", "", ""));
        }
        records.push(record("a@mid.com", "", ""));
        records.push(record("a@also-mid.com", "", ""));
        let top = top_domains(&records, 2);
        assert_eq!(top[0].domain, "big.com");
        assert_eq!(top[0].count, 3);
        assert_eq!(top[1].domain, "also-mid.com");
        assert_eq!(top.len(), 2);
    }

    #[test]
    fn test_coverage_stops_at_threshold() {
        let mut records = Vec::new();
        for _ in 0..8 {
            records.push(record("x@a.com", "", ""));
        }
        records.push(record("x@b.com", "", ""));
        records.push(record("x@c.com", "", ""));
        let cov = domain_coverage(&records, 0.8);
        assert_eq!(cov.top_domains.len(), 1);
        assert!((cov.actual_coverage - 0.8).abs() < 1e-9);

        let cov = domain_coverage(&records, 0.95);
        assert_eq!(cov.top_domains.len(), 3);
        assert!((cov.actual_coverage - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_coverage_of_empty_set() {
        let cov = domain_coverage(&[], 0.95);
        assert!(cov.top_domains.is_empty());
        assert_eq!(cov.actual_coverage, 0.0);
    }

    #[test]
    fn test_compare_domains_overlap() {
        let matches = vec![
            record("x@shop.edu", "", ""),
            record("x@shop.edu", "", ""),
            record("x@store.com", "", ""),
        ];
        let comparison = vec![record("y@shop.edu", "", ""), record("y@cs.edu", "", "")];
        let cmp = compare_domains(&matches, &comparison, 1.0);
        assert_eq!(cmp.comparison_total, 2);
        assert_eq!(cmp.comparison_domains, vec!["cs.edu", "shop.edu"]);
        assert_eq!(cmp.overlap, vec!["shop.edu"]);
    }
}
