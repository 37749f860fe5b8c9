//! Backlog Age Insight
//!
//! Percentiles and tail shares of open-issue age, plus the priority that
//! dominates the long tail.

use std::fmt;

use crate::models::Issue;

use super::engine::{ChartRule, InsightContext};
use super::stats::{fmt_days, fmt_pct, percentile, share_above, value_counts};
use super::types::{ChartId, Insight};

/// Age (days) from which an issue is in the long tail
pub const TAIL_DAYS: f64 = 30.0;
/// Age (days) from which an issue is considered abandoned
pub const DEEP_TAIL_DAYS: f64 = 60.0;
/// Tail share from which the age insight is a warning
const TAIL_WARN_SHARE: f64 = 0.25;
/// Fewest tail issues before a dominant priority is named
const MIN_TAIL_SAMPLE: usize = 3;

/// Age bands shown on the age chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgeBucket {
    UpTo2,
    From3To7,
    From8To14,
    From15To30,
    Over30,
}

impl AgeBucket {
    pub fn for_days(days: f64) -> Self {
        match days {
            d if d <= 2.0 => AgeBucket::UpTo2,
            d if d <= 7.0 => AgeBucket::From3To7,
            d if d <= 14.0 => AgeBucket::From8To14,
            d if d <= 30.0 => AgeBucket::From15To30,
            _ => AgeBucket::Over30,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgeBucket::UpTo2 => "0-2",
            AgeBucket::From3To7 => "3-7",
            AgeBucket::From8To14 => "8-14",
            AgeBucket::From15To30 => "15-30",
            AgeBucket::Over30 => ">30",
        }
    }

    pub fn all() -> &'static [AgeBucket] {
        &[
            AgeBucket::UpTo2,
            AgeBucket::From3To7,
            AgeBucket::From8To14,
            AgeBucket::From15To30,
            AgeBucket::Over30,
        ]
    }
}

impl fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Count open issues per age band, in band order.
///
/// Issues without a creation date are not counted.
pub fn age_histogram(open: &[Issue], now: chrono::DateTime<chrono::Utc>) -> Vec<(AgeBucket, usize)> {
    let mut counts = [0usize; 5];
    for days in open.iter().filter_map(|i| i.age_days(now)) {
        counts[AgeBucket::for_days(days) as usize] += 1;
    }
    AgeBucket::all().iter().copied().zip(counts).collect()
}

/// Insight rule for the backlog age chart
pub struct AgeBucketsRule;

impl AgeBucketsRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AgeBucketsRule {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartRule for AgeBucketsRule {
    fn id(&self) -> ChartId {
        ChartId::AgeBuckets
    }

    fn name(&self) -> &'static str {
        "Backlog Age"
    }

    fn analyze(&self, ctx: &InsightContext<'_>) -> Vec<Insight> {
        let ages: Vec<f64> = ctx.open.iter().filter_map(|i| i.age_days(ctx.now)).collect();
        let (Some(p50), Some(p90)) = (percentile(&ages, 50.0), percentile(&ages, 90.0)) else {
            return Vec::new();
        };

        let tail = share_above(&ages, TAIL_DAYS);
        let deep_tail = share_above(&ages, DEEP_TAIL_DAYS);

        let mut out = vec![Insight::info(
            ChartId::AgeBuckets,
            "percentiles",
            "Backlog age",
            format!(
                "Half of the open backlog is younger than {} and 90% is younger than {} \
                 ({} open issues with a creation date).",
                fmt_days(p50),
                fmt_days(p90),
                ages.len()
            ),
        )];

        out.push(Insight::warn_if(
            tail >= TAIL_WARN_SHARE,
            ChartId::AgeBuckets,
            "tail",
            "Long tail",
            format!(
                "{} of open issues are older than 30 days and {} older than 60 days. \
                 Old issues lose context quickly: close, re-scope or re-prioritise them.",
                fmt_pct(tail),
                fmt_pct(deep_tail)
            ),
        ));

        let tail_priorities: Vec<&str> = ctx
            .open
            .iter()
            .filter(|i| i.age_days(ctx.now).is_some_and(|d| d > TAIL_DAYS))
            .filter_map(Issue::priority_str)
            .collect();
        if tail_priorities.len() >= MIN_TAIL_SAMPLE {
            let counts = value_counts(tail_priorities.iter().copied());
            if let Some((priority, count)) = counts.first() {
                out.push(Insight::info(
                    ChartId::AgeBuckets,
                    "tail_priority",
                    "Who lives in the tail",
                    format!(
                        "{} dominates the issues older than 30 days ({} of {}).",
                        priority,
                        count,
                        tail_priorities.len()
                    ),
                ));
            }
        }

        out
    }
}
