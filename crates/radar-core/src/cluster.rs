//! Similarity clustering of issue summaries
//!
//! Two issues are *linked* when their summary token sets share at least
//! `min_shared_tokens` tokens **and** their Jaccard index reaches
//! `jaccard_threshold`. Requiring both keeps very short summaries (high Jaccard,
//! tiny overlap) and very long ones (large overlap, low Jaccard) from producing
//! false positives. Clusters are the connected components of the link graph.
//!
//! Candidate pairs come from an inverted token index, so only issues sharing at
//! least one token are ever compared. The result is identical to comparing
//! every pair.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::Issue;
use crate::tokenize::tokenize;

/// Thresholds and filters for [`find_similar_issue_clusters`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterParams {
    /// Drop issues with a resolution timestamp before comparing
    pub only_open: bool,
    /// Smallest component reported as a cluster
    pub min_cluster_size: usize,
    /// Minimum Jaccard index for a link, in `(0, 1]`
    pub jaccard_threshold: f64,
    /// Minimum number of shared tokens for a link
    pub min_shared_tokens: usize,
    /// Only consider the first N eligible issues
    pub max_issues: Option<usize>,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            only_open: true,
            min_cluster_size: 2,
            jaccard_threshold: 0.55,
            min_shared_tokens: 3,
            max_issues: None,
        }
    }
}

impl ClusterParams {
    /// Reject thresholds that cannot come from normal data variation
    pub fn validate(&self) -> Result<()> {
        if self.min_cluster_size == 0 {
            return Err(Error::InvalidConfig(
                "min_cluster_size must be at least 1".into(),
            ));
        }
        if self.min_shared_tokens == 0 {
            return Err(Error::InvalidConfig(
                "min_shared_tokens must be at least 1".into(),
            ));
        }
        if !(self.jaccard_threshold > 0.0 && self.jaccard_threshold <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "jaccard_threshold must be in (0, 1], got {}",
                self.jaccard_threshold
            )));
        }
        if self.max_issues == Some(0) {
            return Err(Error::InvalidConfig(
                "max_issues must be positive when set".into(),
            ));
        }
        Ok(())
    }
}

/// A group of issues connected by pairwise summary similarity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueCluster {
    /// Number of distinct keys
    pub size: usize,
    /// Most common summary among members (first seen wins ties)
    pub summary: String,
    pub keys: BTreeSet<String>,
    /// Member statuses, in input order
    pub statuses: Vec<String>,
    /// Member priorities, in input order
    pub priorities: Vec<String>,
}

impl IssueCluster {
    /// Most frequent member status, empty when none is known
    pub fn dominant_status(&self) -> &str {
        most_common(self.statuses.iter().map(String::as_str).filter(|s| !s.is_empty()))
            .unwrap_or("")
    }

    /// Most frequent member priority, empty when none is known
    pub fn dominant_priority(&self) -> &str {
        most_common(self.priorities.iter().map(String::as_str).filter(|s| !s.is_empty()))
            .unwrap_or("")
    }
}

/// Overlap between two token sets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairSimilarity {
    pub shared: usize,
    pub jaccard: f64,
}

/// Shared token count and Jaccard index of two token sets.
///
/// Jaccard is defined as 0 when both sets are empty.
pub fn pair_similarity(a: &BTreeSet<String>, b: &BTreeSet<String>) -> PairSimilarity {
    let shared = a.intersection(b).count();
    let union = a.len() + b.len() - shared;
    PairSimilarity {
        shared,
        jaccard: jaccard_from_counts(shared, union),
    }
}

/// Jaccard index of two token sets
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    pair_similarity(a, b).jaccard
}

fn jaccard_from_counts(shared: usize, union: usize) -> f64 {
    if union == 0 {
        0.0
    } else {
        shared as f64 / union as f64
    }
}

/// Disjoint-set forest with path halving and union by rank
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        if self.rank[ra] < self.rank[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        if self.rank[ra] == self.rank[rb] {
            self.rank[ra] += 1;
        }
    }
}

/// Rows eligible for comparison: keyed, summarized and (optionally) open
fn eligible_issues<'a>(issues: &'a [Issue], params: &ClusterParams) -> Vec<&'a Issue> {
    let rows = issues
        .iter()
        .filter(|i| !params.only_open || i.is_open())
        .filter(|i| i.key_str().is_some() && i.summary.is_some());
    match params.max_issues {
        Some(cap) => rows.take(cap).collect(),
        None => rows.collect(),
    }
}

/// Group issues whose summaries are near-duplicates.
///
/// Rows without a key or summary are ignored, so a collection lacking those
/// columns entirely yields no clusters. Clusters are ordered by size
/// (largest first), then by their smallest key.
pub fn find_similar_issue_clusters(
    issues: &[Issue],
    params: &ClusterParams,
) -> Result<Vec<IssueCluster>> {
    params.validate()?;

    let rows = eligible_issues(issues, params);
    if rows.is_empty() {
        return Ok(vec![]);
    }

    let token_sets: Vec<BTreeSet<String>> = rows
        .iter()
        .map(|i| tokenize(i.summary.as_deref().unwrap_or("")))
        .collect();

    let mut postings: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, tokens) in token_sets.iter().enumerate() {
        for token in tokens {
            postings.entry(token.as_str()).or_default().push(idx);
        }
    }

    let mut forest = UnionFind::new(rows.len());
    let mut links = 0usize;

    for (i, tokens) in token_sets.iter().enumerate() {
        if tokens.len() < params.min_shared_tokens {
            continue;
        }

        // Postings are ascending, so only later rows are counted
        let mut shared_with: HashMap<usize, usize> = HashMap::new();
        for token in tokens {
            if let Some(ids) = postings.get(token.as_str()) {
                for &j in ids.iter().filter(|&&j| j > i) {
                    *shared_with.entry(j).or_insert(0) += 1;
                }
            }
        }

        for (j, shared) in shared_with {
            if shared < params.min_shared_tokens {
                continue;
            }
            let union = tokens.len() + token_sets[j].len() - shared;
            if jaccard_from_counts(shared, union) >= params.jaccard_threshold {
                forest.union(i, j);
                links += 1;
            }
        }
    }

    let mut components: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for idx in 0..rows.len() {
        let root = forest.find(idx);
        components.entry(root).or_default().push(idx);
    }

    let mut clusters: Vec<IssueCluster> = components
        .into_values()
        .filter_map(|members| build_cluster(&rows, &members, params.min_cluster_size))
        .collect();

    clusters.sort_by(|a, b| {
        b.size
            .cmp(&a.size)
            .then_with(|| a.keys.iter().next().cmp(&b.keys.iter().next()))
    });

    debug!(
        issues = rows.len(),
        links,
        clusters = clusters.len(),
        "Similarity clustering complete"
    );

    Ok(clusters)
}

fn build_cluster(rows: &[&Issue], members: &[usize], min_size: usize) -> Option<IssueCluster> {
    let keys: BTreeSet<String> = members
        .iter()
        .filter_map(|&i| rows[i].key_str())
        .map(str::to_string)
        .collect();
    if keys.len() < min_size {
        return None;
    }

    let summary = most_common(
        members
            .iter()
            .map(|&i| rows[i].summary.as_deref().unwrap_or("")),
    )
    .unwrap_or("")
    .to_string();

    Some(IssueCluster {
        size: keys.len(),
        summary,
        keys,
        statuses: members
            .iter()
            .map(|&i| rows[i].status_str().unwrap_or("").to_string())
            .collect(),
        priorities: members
            .iter()
            .map(|&i| rows[i].priority_str().unwrap_or("").to_string())
            .collect(),
    })
}

/// Most frequent item; the earliest one wins ties
fn most_common<'a>(items: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for item in items {
        let count = counts.entry(item).or_insert(0);
        if *count == 0 {
            order.push(item);
        }
        *count += 1;
    }
    let best = order.iter().map(|item| counts[item]).max()?;
    order.into_iter().find(|item| counts[item] == best)
}
