//! Resolution Time Insight

use std::collections::BTreeMap;

use crate::models::{priority_rank, Issue};

use super::engine::{ChartRule, InsightContext};
use super::stats::{fmt_days, fmt_pct, median, percentile, share_above};
use super::types::{ChartId, Insight};

/// Resolution time (days) above which an issue counts as slow
const SLOW_RESOLUTION_DAYS: f64 = 30.0;
/// Slow share from which the slow insight is a warning
const SLOW_WARN_SHARE: f64 = 0.20;

/// Insight rule for the resolution time histogram
pub struct ResolutionRule;

impl ResolutionRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ResolutionRule {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartRule for ResolutionRule {
    fn id(&self) -> ChartId {
        ChartId::ResolutionHist
    }

    fn name(&self) -> &'static str {
        "Resolution Time"
    }

    fn analyze(&self, ctx: &InsightContext<'_>) -> Vec<Insight> {
        let closed: Vec<&Issue> = ctx
            .dff
            .iter()
            .filter(|i| i.resolution_days().is_some())
            .collect();
        let days: Vec<f64> = closed.iter().filter_map(|i| i.resolution_days()).collect();

        let (Some(p50), Some(p90)) = (median(&days), percentile(&days, 90.0)) else {
            return vec![Insight::info(
                ChartId::ResolutionHist,
                "no_data",
                "No closed issues",
                "No issue under the current filters has both a creation and a resolution date.",
            )];
        };

        let mut out = vec![Insight::info(
            ChartId::ResolutionHist,
            "percentiles",
            "Resolution time",
            format!(
                "The median issue is closed in {} and 90% are closed within {} \
                 ({} closed issues).",
                fmt_days(p50),
                fmt_days(p90),
                days.len()
            ),
        )];

        let slow = share_above(&days, SLOW_RESOLUTION_DAYS);
        if slow > 0.0 {
            out.push(Insight::warn_if(
                slow >= SLOW_WARN_SHARE,
                ChartId::ResolutionHist,
                "slow",
                "Slow resolutions",
                format!(
                    "{} of closed issues took more than 30 days. Long resolutions usually \
                     hide waiting time rather than work time.",
                    fmt_pct(slow)
                ),
            ));
        }

        // Median per priority, keyed by rank so the report reads urgent first
        // Labels are grouped ignoring case; the first spelling seen is reported
        let mut by_priority: BTreeMap<(u8, String), (String, Vec<f64>)> = BTreeMap::new();
        for issue in &closed {
            if let (Some(priority), Some(d)) = (issue.priority_str(), issue.resolution_days()) {
                let priority = priority.trim();
                by_priority
                    .entry((priority_rank(priority), priority.to_lowercase()))
                    .or_insert_with(|| (priority.to_string(), Vec::new()))
                    .1
                    .push(d);
            }
        }
        let medians: Vec<(&str, f64)> = by_priority
            .values()
            .filter_map(|(name, values)| median(values).map(|m| (name.as_str(), m)))
            .collect();

        if medians.len() >= 2 {
            let fastest = medians
                .iter()
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .copied();
            let slowest = medians
                .iter()
                .max_by(|a, b| a.1.total_cmp(&b.1))
                .copied();
            if let (Some((fast_name, fast)), Some((slow_name, slow_median))) = (fastest, slowest) {
                out.push(Insight::info(
                    ChartId::ResolutionHist,
                    "by_priority",
                    "Resolution by priority",
                    format!(
                        "{} issues close fastest (median {}) and {} slowest (median {}).",
                        fast_name,
                        fmt_days(fast),
                        slow_name,
                        fmt_days(slow_median)
                    ),
                ));
            }
        }

        out
    }
}
