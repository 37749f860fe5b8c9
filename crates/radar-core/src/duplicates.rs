//! Duplicate report: exact title repeats plus similarity clusters

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cluster::{find_similar_issue_clusters, ClusterParams, IssueCluster};
use crate::error::Result;
use crate::models::Issue;

/// Most exact title groups reported
pub const MAX_TITLE_GROUPS: usize = 12;

/// Issues sharing the very same summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleGroup {
    pub summary: String,
    /// Member keys, in input order
    pub keys: Vec<String>,
}

impl TitleGroup {
    pub fn size(&self) -> usize {
        self.keys.len()
    }
}

/// Group issues by identical trimmed summary.
///
/// Only groups with more than one keyed issue are returned, largest first
/// (ties keep first appearance), at most [`MAX_TITLE_GROUPS`].
pub fn exact_title_groups(issues: &[Issue]) -> Vec<TitleGroup> {
    let mut order: Vec<&str> = Vec::new();
    let mut by_title: HashMap<&str, Vec<String>> = HashMap::new();

    for issue in issues {
        let Some(summary) = issue.summary.as_deref().map(str::trim).filter(|s| !s.is_empty())
        else {
            continue;
        };
        let Some(key) = issue.key_str() else {
            continue;
        };
        let keys = by_title.entry(summary).or_insert_with(|| {
            order.push(summary);
            Vec::new()
        });
        keys.push(key.to_string());
    }

    let mut groups: Vec<TitleGroup> = order
        .into_iter()
        .filter_map(|title| {
            let keys = by_title.remove(title)?;
            (keys.len() > 1).then(|| TitleGroup {
                summary: title.to_string(),
                keys,
            })
        })
        .collect();
    groups.sort_by(|a, b| b.size().cmp(&a.size()));
    groups.truncate(MAX_TITLE_GROUPS);
    groups
}

/// Both duplicate views over one issue collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicatesReport {
    pub title_groups: Vec<TitleGroup>,
    /// Similarity clusters not already covered by a single title group
    pub clusters: Vec<IssueCluster>,
}

impl DuplicatesReport {
    pub fn is_empty(&self) -> bool {
        self.title_groups.is_empty() && self.clusters.is_empty()
    }
}

/// Build the duplicate report.
///
/// Title groups honour `params.only_open` and `params.max_issues` like the
/// clusterer. A cluster whose keys all sit in one title group adds nothing
/// and is dropped.
pub fn build_duplicates_report(issues: &[Issue], params: &ClusterParams) -> Result<DuplicatesReport> {
    let clusters = find_similar_issue_clusters(issues, params)?;

    let rows: Vec<Issue> = issues
        .iter()
        .filter(|i| !params.only_open || i.is_open())
        .take(params.max_issues.unwrap_or(usize::MAX))
        .cloned()
        .collect();
    let title_groups = exact_title_groups(&rows);

    let title_sets: Vec<BTreeSet<&str>> = title_groups
        .iter()
        .map(|g| g.keys.iter().map(String::as_str).collect())
        .collect();
    let before = clusters.len();
    let clusters: Vec<IssueCluster> = clusters
        .into_iter()
        .filter(|c| {
            !title_sets
                .iter()
                .any(|set| c.keys.iter().all(|k| set.contains(k.as_str())))
        })
        .collect();

    debug!(
        title_groups = title_groups.len(),
        clusters = clusters.len(),
        redundant = before - clusters.len(),
        "Duplicates report built"
    );

    Ok(DuplicatesReport {
        title_groups,
        clusters,
    })
}
