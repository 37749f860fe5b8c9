//! Aggregation and formatting helpers shared by the chart rules

use std::collections::HashMap;

use crate::models::Issue;
use crate::status::{normalize_status, StatusTaxonomy};

/// One status bucket of an issue collection
#[derive(Debug, Clone, PartialEq)]
pub struct StatusBucket {
    /// Canonical name for known statuses, trimmed label otherwise
    pub name: String,
    pub count: usize,
    pub rank: usize,
    pub terminal: bool,
}

/// Count issues per status.
///
/// Issues without a status are not counted. Buckets are ordered by count
/// (largest first); equal counts fall back to the lowest canonical rank, then
/// to the case-insensitive name, so the modal bucket is deterministic.
pub fn status_buckets(issues: &[Issue], taxonomy: &StatusTaxonomy) -> Vec<StatusBucket> {
    // Keyed by normalized label; the first spelling seen names the bucket
    let mut by_key: HashMap<String, (String, usize)> = HashMap::new();
    for status in issues.iter().filter_map(Issue::status_str) {
        let name = taxonomy.display_name(status);
        let entry = by_key
            .entry(normalize_status(&name))
            .or_insert_with(|| (name, 0));
        entry.1 += 1;
    }

    let mut buckets: Vec<StatusBucket> = by_key
        .into_values()
        .map(|(name, count)| StatusBucket {
            rank: taxonomy.rank(&name),
            terminal: taxonomy.is_terminal(&name),
            name,
            count,
        })
        .collect();

    buckets.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.rank.cmp(&b.rank))
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    buckets
}

/// Count labels ignoring case and surrounding whitespace, largest first,
/// ties by first appearance. Each label keeps its first-seen spelling.
pub fn value_counts<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut out: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for value in values {
        let label = value.trim();
        match index.get(&label.to_lowercase()) {
            Some(&i) => out[i].1 += 1,
            None => {
                index.insert(label.to_lowercase(), out.len());
                out.push((label.to_string(), 1));
            }
        }
    }
    out.sort_by(|a, b| b.1.cmp(&a.1));
    out
}

/// Herfindahl-Hirschman index of a count distribution (0..1, higher is more concentrated)
pub fn hhi(counts: &[usize]) -> Option<f64> {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return None;
    }
    Some(
        counts
            .iter()
            .map(|&c| {
                let share = c as f64 / total as f64;
                share * share
            })
            .sum(),
    )
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Percentile with linear interpolation between closest ranks, `p` in 0..=100
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let pos = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

pub fn median(values: &[f64]) -> Option<f64> {
    percentile(values, 50.0)
}

/// Share of values strictly above a threshold
pub fn share_above(values: &[f64], threshold: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|&&v| v > threshold).count() as f64 / values.len() as f64
}

pub fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// `0.4567` -> `45.7%`
pub fn fmt_pct(share: f64) -> String {
    format!("{:.1}%", 100.0 * share)
}

/// One decimal under ten days, whole days above
pub fn fmt_days(days: f64) -> String {
    let days = days.max(0.0);
    if days < 10.0 {
        format!("{:.1} days", days)
    } else {
        format!("{:.0} days", days)
    }
}

/// `a`, `a and b`, `a, b and c`
pub fn join_names(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [only] => only.to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}
