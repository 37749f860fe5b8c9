//! Duplicate report command

use std::path::Path;

use anyhow::Result;
use radar_core::{build_duplicates_report, ClusterParams};

use super::{load_export, truncate};

/// Settings cluster parameters with command-line overrides applied
pub fn cluster_params(
    base: &ClusterParams,
    include_closed: bool,
    min_size: Option<usize>,
    jaccard: Option<f64>,
    min_shared: Option<usize>,
    max_issues: Option<usize>,
) -> ClusterParams {
    let mut params = base.clone();
    if include_closed {
        params.only_open = false;
    }
    if let Some(n) = min_size {
        params.min_cluster_size = n;
    }
    if let Some(x) = jaccard {
        params.jaccard_threshold = x;
    }
    if let Some(n) = min_shared {
        params.min_shared_tokens = n;
    }
    if max_issues.is_some() {
        params.max_issues = max_issues;
    }
    params
}

pub fn cmd_duplicates(file: &Path, params: &ClusterParams, json: bool) -> Result<()> {
    let issues = load_export(file)?;
    let report = build_duplicates_report(&issues, params)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\n🔁 Duplicate Report ({} issues)", issues.len());
    println!(
        "   jaccard ≥ {:.2}, shared tokens ≥ {}, cluster size ≥ {}{}",
        params.jaccard_threshold,
        params.min_shared_tokens,
        params.min_cluster_size,
        if params.only_open { ", open only" } else { "" }
    );
    println!("   ─────────────────────────────────────────────");

    if report.is_empty() {
        println!("\n   No duplicates found.");
        return Ok(());
    }

    if !report.title_groups.is_empty() {
        println!("\n📋 Exact title repeats ({})", report.title_groups.len());
        for group in &report.title_groups {
            println!("   {:>3}x  {}", group.size(), truncate(&group.summary, 70));
            println!("         {}", group.keys.join(", "));
        }
    }

    if !report.clusters.is_empty() {
        println!("\n🧩 Similar issue clusters ({})", report.clusters.len());
        for cluster in &report.clusters {
            println!(
                "   {:>3}   {} · {} · {}",
                cluster.size,
                truncate(&cluster.summary, 50),
                cluster.dominant_status(),
                cluster.dominant_priority()
            );
            let keys: Vec<&str> = cluster.keys.iter().map(String::as_str).collect();
            println!("         {}", keys.join(", "));
        }
    }

    Ok(())
}
