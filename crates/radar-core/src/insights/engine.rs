//! Insight Engine - routes a chart id to its rule and collects the insights

use chrono::{DateTime, Utc};

use crate::models::Issue;
use crate::status::StatusTaxonomy;

use super::types::{ChartId, Insight};
use super::{
    AgeBucketsRule, ExitFunnelRule, FlowRule, OpenStatusRule, PriorityMixRule, ResolutionRule,
};

/// Most insights shown for a single chart
pub const MAX_INSIGHTS_PER_CHART: usize = 4;

/// Inputs shared by every chart rule
pub struct InsightContext<'a> {
    /// Issues matching the current filters (open and closed)
    pub dff: &'a [Issue],
    /// `dff` restricted to open issues
    pub open: &'a [Issue],
    /// Reference instant for ages and flow windows
    pub now: DateTime<Utc>,
    pub taxonomy: &'a StatusTaxonomy,
}

impl<'a> InsightContext<'a> {
    /// Create a context evaluated at the current instant
    pub fn new(dff: &'a [Issue], open: &'a [Issue], taxonomy: &'a StatusTaxonomy) -> Self {
        Self::at(dff, open, taxonomy, Utc::now())
    }

    /// Create a context evaluated at a fixed instant
    pub fn at(
        dff: &'a [Issue],
        open: &'a [Issue],
        taxonomy: &'a StatusTaxonomy,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            dff,
            open,
            now,
            taxonomy,
        }
    }
}

/// Trait for chart insight rules
///
/// Rules never fail: missing columns and empty collections produce a neutral
/// insight or none at all.
pub trait ChartRule: Send + Sync {
    /// Chart this rule explains
    fn id(&self) -> ChartId;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Compute the insights for the chart, most important first
    fn analyze(&self, ctx: &InsightContext<'_>) -> Vec<Insight>;
}

/// The main insight engine: one rule per chart
pub struct InsightEngine {
    rules: Vec<Box<dyn ChartRule>>,
}

impl Default for InsightEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightEngine {
    /// Create a new insight engine with the built-in chart rules
    pub fn new() -> Self {
        let mut engine = Self { rules: vec![] };

        engine.register(Box::new(FlowRule::new()));
        engine.register(Box::new(AgeBucketsRule::new()));
        engine.register(Box::new(ResolutionRule::new()));
        engine.register(Box::new(PriorityMixRule::new()));
        engine.register(Box::new(OpenStatusRule::new()));
        engine.register(Box::new(ExitFunnelRule::new()));

        engine
    }

    /// Register a rule; a later rule for the same chart replaces the earlier one
    pub fn register(&mut self, rule: Box<dyn ChartRule>) {
        self.rules.retain(|r| r.id() != rule.id());
        self.rules.push(rule);
    }

    /// Build the insights for one chart.
    ///
    /// Unknown chart ids get a single informational placeholder.
    pub fn build(&self, chart_id: &str, ctx: &InsightContext<'_>) -> Vec<Insight> {
        let rule = chart_id
            .parse::<ChartId>()
            .ok()
            .and_then(|id| self.rules.iter().find(|r| r.id() == id));

        let Some(rule) = rule else {
            tracing::debug!(chart = chart_id, "No insight rule registered");
            return vec![fallback_insight(chart_id)];
        };

        let mut insights = rule.analyze(ctx);
        insights.truncate(MAX_INSIGHTS_PER_CHART);

        tracing::debug!(
            chart = rule.id().as_str(),
            rule = rule.name(),
            open = ctx.open.len(),
            filtered = ctx.dff.len(),
            count = insights.len(),
            "Chart insights built"
        );

        insights
    }

    /// Charts with a registered rule
    pub fn chart_ids(&self) -> Vec<ChartId> {
        self.rules.iter().map(|r| r.id()).collect()
    }
}

fn fallback_insight(chart_id: &str) -> Insight {
    let chart = chart_id.trim();
    let chart = if chart.is_empty() { "unknown" } else { chart };
    Insight::new(
        chart,
        "none",
        super::types::InsightLevel::Info,
        "No specific insights",
        "No insights are defined for this chart.",
    )
}

/// Build insights for a chart with the built-in taxonomy, evaluated now.
///
/// `dff` is the filtered collection, `open` the same collection restricted to
/// open issues.
pub fn build_chart_insights(chart_id: &str, dff: &[Issue], open: &[Issue]) -> Vec<Insight> {
    let taxonomy = StatusTaxonomy::builtin();
    let ctx = InsightContext::new(dff, open, &taxonomy);
    InsightEngine::new().build(chart_id, &ctx)
}
