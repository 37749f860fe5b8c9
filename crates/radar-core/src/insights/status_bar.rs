//! Open Status Insight
//!
//! Reads the status distribution of open issues and looks for the funnel's
//! real chokepoint. A naive "largest bucket" rule would call Accepted or
//! Ready to Deploy a bottleneck whenever closure bookkeeping lags, so terminal
//! stages are reported as accumulation instead, and the bottleneck search only
//! considers operational stages.

use crate::models::Issue;
use crate::status::{normalize_status, StatusStage};

use super::engine::{ChartRule, InsightContext};
use super::stats::{fmt_days, fmt_pct, join_names, mean, ratio, status_buckets, StatusBucket};
use super::types::{ChartId, Insight};

/// Mean age (days) from which a bottleneck is a warning
const STALE_BOTTLENECK_DAYS: f64 = 30.0;
/// Share of open issues above which one operational status is overloaded
const CONCENTRATION_SHARE: f64 = 0.45;
/// Share of open issues in triage that signals triage debt
const TRIAGE_DEBT_SHARE: f64 = 0.35;

/// Insight rule for the open issues by status chart
pub struct OpenStatusRule;

impl OpenStatusRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OpenStatusRule {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartRule for OpenStatusRule {
    fn id(&self) -> ChartId {
        ChartId::OpenStatusBar
    }

    fn name(&self) -> &'static str {
        "Open Status"
    }

    fn analyze(&self, ctx: &InsightContext<'_>) -> Vec<Insight> {
        let buckets = status_buckets(ctx.open, ctx.taxonomy);
        if buckets.is_empty() {
            return vec![Insight::info(
                ChartId::OpenStatusBar,
                "no_data",
                "No status data",
                "There are no open issues with a status under the current filters.",
            )];
        }

        let total: usize = buckets.iter().map(|b| b.count).sum();
        let modal = &buckets[0];
        let operational_leader = buckets.iter().find(|b| !b.terminal);

        let mut out = Vec::new();

        if modal.terminal {
            out.push(terminal_accumulation(&buckets, modal, operational_leader, total));
        } else {
            out.push(bottleneck(ctx, modal, total));
        }

        if let Some(leader) = operational_leader {
            let share = ratio(leader.count, total);
            if share >= CONCENTRATION_SHARE {
                out.push(Insight::warn(
                    ChartId::OpenStatusBar,
                    "concentration",
                    "Load concentrated in one status",
                    format!(
                        "{} holds {} of the open backlog ({}/{}). When one operational \
                         status passes ~45%, that step of the flow usually does not scale \
                         with the incoming work.",
                        leader.name,
                        fmt_pct(share),
                        leader.count,
                        total
                    ),
                ));
            }
        }

        let triage = stage_count(ctx, StatusStage::Triage);
        let triage_share = ratio(triage, total);
        if triage_share >= TRIAGE_DEBT_SHARE {
            out.push(Insight::warn(
                ChartId::OpenStatusBar,
                "triage_debt",
                "Triage debt",
                format!(
                    "{} of open issues ({}) are still waiting for a first diagnosis ({}). \
                     A daily triage routine usually drains this quickly.",
                    fmt_pct(triage_share),
                    triage,
                    join_names(&ctx.taxonomy.names_for_stage(StatusStage::Triage))
                ),
            ));
        }

        let blocked = stage_count(ctx, StatusStage::Blocked);
        if blocked > 0 {
            out.push(Insight::warn_if(
                ratio(blocked, total) >= 0.15,
                ChartId::OpenStatusBar,
                "blocked",
                "Blocked work",
                format!(
                    "{} open issues are blocked ({}). A 24h unblocking loop frees \
                     capacity without growing the team.",
                    blocked,
                    fmt_pct(ratio(blocked, total))
                ),
            ));
        }

        out.push(Insight::info(
            ChartId::OpenStatusBar,
            "hygiene",
            "Flow hygiene",
            format!(
                "Statuses in use under the current filters: {}. Too many blur the flow, \
                 too few hide where work waits; 6-10 statuses that stand for decisions \
                 tend to work best.",
                buckets.len()
            ),
        ));

        out
    }
}

fn terminal_accumulation(
    buckets: &[StatusBucket],
    modal: &StatusBucket,
    operational_leader: Option<&StatusBucket>,
    total: usize,
) -> Insight {
    let mut terminal: Vec<&StatusBucket> = buckets.iter().filter(|b| b.terminal).collect();
    terminal.sort_by_key(|b| b.rank);
    let names: Vec<&str> = terminal.iter().map(|b| b.name.as_str()).collect();
    let verb = if names.len() == 1 {
        "is a terminal stage"
    } else {
        "are terminal stages"
    };

    let mut body = format!(
        "{} holds {} of {} open issues ({}). {} {}: the work is functionally done and \
         only awaits closure bookkeeping, so this accumulation is not interpreted as a \
         bottleneck.",
        modal.name,
        modal.count,
        total,
        fmt_pct(ratio(modal.count, total)),
        join_names(&names),
        verb
    );
    match operational_leader {
        Some(leader) => body.push_str(&format!(
            " Among operational stages, {} leads with {} issues ({}).",
            leader.name,
            leader.count,
            fmt_pct(ratio(leader.count, total))
        )),
        None => body.push_str(" No operational stage holds open work under this filter."),
    }

    Insight::info(
        ChartId::OpenStatusBar,
        "terminal_accumulation",
        "Accumulation in closing stages",
        body,
    )
}

fn bottleneck(ctx: &InsightContext<'_>, modal: &StatusBucket, total: usize) -> Insight {
    let ages: Vec<f64> = ctx
        .open
        .iter()
        .filter(|i| in_bucket(ctx, i, modal))
        .filter_map(|i| i.age_days(ctx.now))
        .collect();
    let mean_age = mean(&ages);

    let age_clause = match mean_age {
        Some(days) => format!(" with a mean age of {}", fmt_days(days)),
        None => String::new(),
    };

    Insight::warn_if(
        mean_age.is_some_and(|d| d >= STALE_BOTTLENECK_DAYS),
        ChartId::OpenStatusBar,
        "bottleneck",
        "Possible bottleneck",
        format!(
            "{} concentrates {} of {} open issues ({}){}. Check whether it is a waiting \
             state (blocked, waiting for a third party) and give dependencies an explicit lane.",
            modal.name,
            modal.count,
            total,
            fmt_pct(ratio(modal.count, total)),
            age_clause
        ),
    )
}

fn in_bucket(ctx: &InsightContext<'_>, issue: &Issue, bucket: &StatusBucket) -> bool {
    let wanted = normalize_status(&bucket.name);
    issue
        .status_str()
        .is_some_and(|s| normalize_status(&ctx.taxonomy.display_name(s)) == wanted)
}

fn stage_count(ctx: &InsightContext<'_>, stage: StatusStage) -> usize {
    ctx.open
        .iter()
        .filter_map(Issue::status_str)
        .filter(|s| ctx.taxonomy.stage(s) == Some(stage))
        .count()
}
