//! Exit Funnel Insight
//!
//! Tracks how work leaves the funnel once it is functionally done:
//! Accepted -> Ready to Deploy -> Deployed. Deployed issues have already left
//! the funnel; only Accepted and Ready to Deploy count as "waiting to exit".

use crate::models::Issue;
use crate::status::{StatusStage, StatusTaxonomy};

use super::engine::{ChartRule, InsightContext};
use super::stats::{fmt_pct, ratio};
use super::types::{ChartId, Insight};

/// Fewest issues in the exit stages before conversions are reported
const MIN_FUNNEL_SAMPLE: usize = 3;
/// Accepted -> Ready to Deploy conversion below this warns
const ACCEPTED_CONVERSION_FLOOR: f64 = 0.35;
/// Ready to Deploy -> Deployed conversion below this warns
const RELEASE_CONVERSION_FLOOR: f64 = 0.70;

fn count_stage(dff: &[Issue], taxonomy: &StatusTaxonomy, stage: StatusStage) -> usize {
    dff.iter()
        .filter_map(Issue::status_str)
        .filter(|s| taxonomy.stage(s) == Some(stage))
        .count()
}

/// `(accepted, ready_to_deploy, total_considered)` for a filtered collection.
///
/// `total_considered` is the number of issues waiting to exit
/// (`accepted + ready_to_deploy`). Empty collections and collections without
/// statuses give `(0, 0, 0)`.
pub fn exit_funnel_counts_with(dff: &[Issue], taxonomy: &StatusTaxonomy) -> (usize, usize, usize) {
    let accepted = count_stage(dff, taxonomy, StatusStage::Accepted);
    let ready = count_stage(dff, taxonomy, StatusStage::ReadyToDeploy);
    (accepted, ready, accepted + ready)
}

/// [`exit_funnel_counts_with`] using the built-in taxonomy
pub fn exit_funnel_counts(dff: &[Issue]) -> (usize, usize, usize) {
    exit_funnel_counts_with(dff, &StatusTaxonomy::builtin())
}

/// Insight rule for the exit funnel chart
pub struct ExitFunnelRule;

impl ExitFunnelRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ExitFunnelRule {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartRule for ExitFunnelRule {
    fn id(&self) -> ChartId {
        ChartId::ExitFunnel
    }

    fn name(&self) -> &'static str {
        "Exit Funnel"
    }

    fn analyze(&self, ctx: &InsightContext<'_>) -> Vec<Insight> {
        let (accepted, ready, waiting) = exit_funnel_counts_with(ctx.dff, ctx.taxonomy);
        let deployed = count_stage(ctx.dff, ctx.taxonomy, StatusStage::Deployed);

        if waiting + deployed < MIN_FUNNEL_SAMPLE {
            return vec![Insight::info(
                ChartId::ExitFunnel,
                "no_data",
                "Not enough issues in the exit funnel",
                format!(
                    "Fewer than {} issues are Accepted, Ready to Deploy or Deployed under \
                     the current filters.",
                    MIN_FUNNEL_SAMPLE
                ),
            )];
        }

        let mut out = vec![Insight::info(
            ChartId::ExitFunnel,
            "summary",
            "Work waiting to exit",
            format!(
                "{} issues are functionally done and waiting to exit: {} Accepted and {} \
                 Ready to Deploy ({} already Deployed). Ageing here is closure and release \
                 bookkeeping, not stuck delivery work.",
                waiting, accepted, ready, deployed
            ),
        )];

        if accepted > 0 {
            let conversion = ratio(ready, accepted);
            if conversion < ACCEPTED_CONVERSION_FLOOR {
                out.push(Insight::warn(
                    ChartId::ExitFunnel,
                    "accepted_exit",
                    "Slow exit from Accepted",
                    format!(
                        "{} in Accepted against {} in Ready to Deploy (conversion {}). \
                         Set a maximum stay in Accepted and review it daily.",
                        accepted,
                        ready,
                        fmt_pct(conversion)
                    ),
                ));
            }
        }

        if ready > 0 {
            let conversion = ratio(deployed, ready);
            if conversion < RELEASE_CONVERSION_FLOOR {
                out.push(Insight::warn(
                    ChartId::ExitFunnel,
                    "release",
                    "Release cadence lagging",
                    format!(
                        "{} in Ready to Deploy against {} Deployed (conversion {}). \
                         Review release capacity and deployment windows.",
                        ready,
                        deployed,
                        fmt_pct(conversion)
                    ),
                ));
            }
        }

        out
    }
}
