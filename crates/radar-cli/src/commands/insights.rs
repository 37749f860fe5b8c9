//! Chart insights command

use std::path::Path;

use anyhow::{anyhow, Result};
use radar_core::{
    open_only, ChartId, Insight, InsightContext, InsightEngine, InsightLevel, LearningStore,
    Settings,
};

use super::{load_export, load_taxonomy, ScopeFilter};

fn level_icon(level: InsightLevel) -> &'static str {
    match level {
        InsightLevel::Ok => "✅",
        InsightLevel::Info => "💡",
        InsightLevel::Warn => "⚠️ ",
    }
}

/// Build the insights for a chart and return the ones shown.
///
/// Without `all`, insights go through the rotation of the scope's learning
/// state; the scope's interaction count is bumped and the store saved.
pub fn cmd_insights(
    settings: &Settings,
    file: &Path,
    chart: &str,
    scope: &ScopeFilter,
    all: bool,
    json: bool,
) -> Result<Vec<Insight>> {
    let chart_id: ChartId = chart.parse().map_err(|e: String| anyhow!(e))?;

    let issues = load_export(file)?;
    let dff = scope.apply(&issues);
    let scope = scope.canonical(&dff);
    let open = open_only(&dff);
    let taxonomy = load_taxonomy(settings)?;

    let ctx = InsightContext::new(&dff, &open, &taxonomy);
    let insights = InsightEngine::new().build(chart_id.as_str(), &ctx);

    let shown = if all {
        insights.clone()
    } else {
        let mut store = LearningStore::open(settings.learning_path());
        let key = scope.scope_key();
        let (mut state, interactions) = store.get_scope(&key);
        let shown = settings.rotation.select(&insights, &mut state);
        store.set_scope(
            Some(key.as_str()),
            state,
            interactions + 1,
            scope.country_str(),
            scope.source_str(),
            None,
        );
        store.save()?;
        tracing::debug!(scope = %key, shown = shown.len(), total = insights.len(), "Insights rotated");
        shown
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(shown);
    }

    println!(
        "\n💡 Insights: {} ({} issues, {} open)",
        chart_id,
        dff.len(),
        open.len()
    );
    if scope.country.is_some() || scope.source.is_some() {
        println!("   Scope: {}", scope.scope_key());
    }
    println!("   ─────────────────────────────────────────────");

    for insight in &shown {
        println!("\n{} {}", level_icon(insight.level), insight.title);
        println!("   {}", insight.body);
    }

    let hidden = insights.len().saturating_sub(shown.len());
    if hidden > 0 {
        println!(
            "\n   {} more insight(s) held back by rotation. Use --all to see everything.",
            hidden
        );
    }

    Ok(shown)
}
