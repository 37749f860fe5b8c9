//! Priority Mix Insight

use crate::models::{is_high_priority, Issue};

use super::age::TAIL_DAYS;
use super::engine::{ChartRule, InsightContext};
use super::stats::{fmt_pct, hhi, ratio, value_counts};
use super::types::{ChartId, Insight};

/// HHI from which the priority split is concentrated
const HHI_WARN: f64 = 0.35;
/// High-priority share from which urgency is inflated
const HIGH_SHARE_WARN: f64 = 0.35;

/// Insight rule for the open issues by priority chart
pub struct PriorityMixRule;

impl PriorityMixRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PriorityMixRule {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartRule for PriorityMixRule {
    fn id(&self) -> ChartId {
        ChartId::OpenPriorityPie
    }

    fn name(&self) -> &'static str {
        "Priority Mix"
    }

    fn analyze(&self, ctx: &InsightContext<'_>) -> Vec<Insight> {
        let priorities: Vec<&str> = ctx.open.iter().filter_map(Issue::priority_str).collect();
        let counts = value_counts(priorities.iter().copied());
        let sizes: Vec<usize> = counts.iter().map(|(_, c)| *c).collect();
        let Some(index) = hhi(&sizes) else {
            return vec![Insight::info(
                ChartId::OpenPriorityPie,
                "no_data",
                "No priority data",
                "There are no open issues with a priority under the current filters.",
            )];
        };

        let total = priorities.len();
        let mut out = Vec::new();

        if let Some((top, top_count)) = counts.first() {
            out.push(Insight::warn_if(
                index >= HHI_WARN,
                ChartId::OpenPriorityPie,
                "concentration",
                "Priority concentration",
                format!(
                    "{} leads the open backlog with {} of {} issues (HHI {:.2}). A split \
                     dominated by one level stops helping anyone decide what goes first.",
                    top, top_count, total, index
                ),
            ));
        }

        let high = priorities.iter().filter(|p| is_high_priority(p)).count();
        let high_share = ratio(high, total);
        if high_share >= HIGH_SHARE_WARN {
            out.push(Insight::warn(
                ChartId::OpenPriorityPie,
                "high_share",
                "Urgency inflation",
                format!(
                    "{} of open issues are Highest or High ({} of {}). When everything is \
                     urgent, nothing is: review the criteria for the top levels.",
                    fmt_pct(high_share),
                    high,
                    total
                ),
            ));
        }

        let old: Vec<&str> = ctx
            .open
            .iter()
            .filter(|i| i.age_days(ctx.now).is_some_and(|d| d > TAIL_DAYS))
            .filter_map(Issue::priority_str)
            .collect();
        if let Some((priority, count)) = value_counts(old.iter().copied()).first() {
            out.push(Insight::info(
                ChartId::OpenPriorityPie,
                "old_priority",
                "Priority of old issues",
                format!(
                    "Among issues older than 30 days, {} is the most common priority \
                     ({} of {}).",
                    priority,
                    count,
                    old.len()
                ),
            ));
        }

        out
    }
}
