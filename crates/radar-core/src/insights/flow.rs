//! Flow Insight
//!
//! Daily created vs resolved counts over a trailing window, and what they say
//! about the backlog: is it growing, how long would it take to drain, and when
//! does work arrive.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::models::Issue;

use super::engine::{ChartRule, InsightContext};
use super::stats::{fmt_days, median};
use super::types::{ChartId, Insight, InsightLevel};

/// Days of history in the flow chart
pub const LOOKBACK_DAYS: i64 = 90;
/// Window (days) for the inflow vs outflow comparison
const BALANCE_WINDOW: usize = 14;
/// Window (days) for the closing pace used by the runway
const PACE_WINDOW: usize = 30;
/// Runway (days) beyond which draining the backlog is a warning
const RUNWAY_WARN_DAYS: f64 = 120.0;
/// A day with this many times the median creations is a spike
const SPIKE_FACTOR: f64 = 3.0;
/// Fewest creations before a busiest weekday is named
const MIN_WEEKDAY_SAMPLE: usize = 7;

/// Created and closed counts for one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyFlow {
    pub date: NaiveDate,
    pub created: usize,
    pub closed: usize,
}

/// Daily flow for the `lookback_days` days ending at `now`, oldest first.
///
/// Empty when no issue was created or resolved inside the window.
pub fn daily_flow(dff: &[Issue], now: DateTime<Utc>, lookback_days: i64) -> Vec<DailyFlow> {
    let end = now.date_naive();
    let start = end - Duration::days(lookback_days.max(1) - 1);

    let mut days: Vec<DailyFlow> = start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|date| DailyFlow {
            date,
            created: 0,
            closed: 0,
        })
        .collect();

    let index = |ts: DateTime<Utc>| -> Option<usize> {
        let date = ts.date_naive();
        (date >= start && date <= end).then(|| (date - start).num_days() as usize)
    };

    let mut any = false;
    for issue in dff {
        if let Some(i) = issue.created.and_then(index) {
            days[i].created += 1;
            any = true;
        }
        if let Some(i) = issue.resolved.and_then(index) {
            days[i].closed += 1;
            any = true;
        }
    }

    if any {
        days
    } else {
        Vec::new()
    }
}

fn tail_sum(days: &[DailyFlow], window: usize, field: fn(&DailyFlow) -> usize) -> usize {
    days.iter().rev().take(window).map(field).sum()
}

/// Insight rule for the created vs resolved timeseries
pub struct FlowRule;

impl FlowRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FlowRule {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartRule for FlowRule {
    fn id(&self) -> ChartId {
        ChartId::Timeseries
    }

    fn name(&self) -> &'static str {
        "Flow"
    }

    fn analyze(&self, ctx: &InsightContext<'_>) -> Vec<Insight> {
        let days = daily_flow(ctx.dff, ctx.now, LOOKBACK_DAYS);
        if days.is_empty() {
            return vec![Insight::info(
                ChartId::Timeseries,
                "no_data",
                "Not enough dates",
                "There are not enough creation or resolution dates under the current filters \
                 to read the flow.",
            )];
        }

        let mut out = Vec::new();

        let created_14 = tail_sum(&days, BALANCE_WINDOW, |d| d.created);
        let closed_14 = tail_sum(&days, BALANCE_WINDOW, |d| d.closed);
        out.push(if created_14 > closed_14 {
            Insight::warn(
                ChartId::Timeseries,
                "balance",
                "Backlog growing",
                format!(
                    "In the last 14 days {} issues came in and {} were closed (net +{}). \
                     The backlog grows unless closing capacity goes up.",
                    created_14,
                    closed_14,
                    created_14 - closed_14
                ),
            )
        } else if created_14 < closed_14 {
            Insight::new(
                ChartId::Timeseries.as_str(),
                "balance",
                InsightLevel::Ok,
                "Backlog shrinking",
                format!(
                    "In the last 14 days {} issues were closed against {} new ones (net -{}). \
                     A good moment to clear the oldest work.",
                    closed_14,
                    created_14,
                    closed_14 - created_14
                ),
            )
        } else {
            Insight::info(
                ChartId::Timeseries,
                "balance",
                "Balanced flow",
                format!(
                    "In the last 14 days inflow and outflow matched ({} each).",
                    created_14
                ),
            )
        });

        let closed_30 = tail_sum(&days, PACE_WINDOW, |d| d.closed);
        let open_now = ctx.open.len();
        if closed_30 > 0 {
            let pace = closed_30 as f64 / PACE_WINDOW as f64;
            let runway = open_now as f64 / pace;
            out.push(Insight::warn_if(
                runway > RUNWAY_WARN_DAYS,
                ChartId::Timeseries,
                "runway",
                "Time to drain the backlog",
                format!(
                    "Closing {:.2} issues a day, the {} open issues would take about {} \
                     with no new demand.",
                    pace,
                    open_now,
                    fmt_days(runway)
                ),
            ));
        } else if open_now > 0 {
            out.push(Insight::warn(
                ChartId::Timeseries,
                "runway",
                "No visible closing capacity",
                "Nothing was closed in the last 30 days, so the backlog cannot be projected \
                 to drain. Unblock the final stages of the flow first.",
            ));
        }

        let created: Vec<f64> = days.iter().map(|d| d.created as f64).collect();
        if let (Some(med), Some(peak)) = (
            median(&created),
            days.iter().max_by_key(|d| (d.created, std::cmp::Reverse(d.date))),
        ) {
            if peak.created as f64 >= SPIKE_FACTOR * med.max(1.0) {
                out.push(Insight::info(
                    ChartId::Timeseries,
                    "spike",
                    "Creation spike",
                    format!(
                        "{} issues were created on {}, against a daily median of {:.1}. \
                         Check whether a release or an incident lines up with that day.",
                        peak.created, peak.date, med
                    ),
                ));
            }
        }

        let mut per_weekday = [0usize; 7];
        for d in &days {
            per_weekday[d.date.weekday().num_days_from_monday() as usize] += d.created;
        }
        let total_created: usize = per_weekday.iter().sum();
        if total_created >= MIN_WEEKDAY_SAMPLE {
            let (busiest, count) = per_weekday
                .iter()
                .enumerate()
                .fold((0usize, 0usize), |best, (i, &c)| if c > best.1 { (i, c) } else { best });
            out.push(Insight::info(
                ChartId::Timeseries,
                "weekday",
                "Busiest weekday",
                format!(
                    "{} receives the most new issues ({} of {} in the last {} days).",
                    WEEKDAYS[busiest],
                    count,
                    total_created,
                    LOOKBACK_DAYS
                ),
            ));
        }

        out
    }
}

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];
