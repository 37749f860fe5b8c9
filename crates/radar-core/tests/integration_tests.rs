//! Integration tests for radar-core
//!
//! These tests exercise the full import -> analyze -> persist workflow.

use chrono::{Duration, Utc};
use radar_core::{
    build_chart_insights, build_duplicates_report, exit_funnel_counts, find_similar_issue_clusters,
    learning_scope_key, open_only, parse_issues_csv, ClusterParams, InsightRotation, LearningStore,
    ScopeState,
};

/// Helper to create a small Jira-like export
/// Contains one near-duplicate pair (A-1/A-2), one exact title pair
/// (A-4/A-5), a closed issue and an Accepted-heavy open backlog.
fn jira_export() -> String {
    let created = (Utc::now() - Duration::days(20)).format("%Y-%m-%d");
    let resolved = (Utc::now() - Duration::days(2)).format("%Y-%m-%d %H:%M:%S");
    format!(
        "key,summary,status,priority,created,resolved,source_id,country
A-1,Payment API timeout when submitting transfer,Accepted,High,{c},,jira:mexico:core,Mexico
A-2,Payment API timeout while submitting transfer,Accepted,High,{c},,jira:mexico:core,Mexico
A-3,Dark mode colors wrong in settings screen,Accepted,Low,{c},,jira:mexico:core,Mexico
A-4,Export button missing on reports page,Ready to Deploy,Medium,{c},,jira:mexico:core,Mexico
A-5,Export button missing on reports page,New,Medium,{c},,jira:mexico:core,Mexico
A-6,Session expires too early on mobile app,Deployed,Low,{c},{r},jira:mexico:core,Mexico
",
        c = created,
        r = resolved
    )
}

// =============================================================================
// Duplicate Detection
// =============================================================================

#[test]
fn test_reference_cluster_example() {
    let issues = parse_issues_csv(jira_export().as_bytes()).expect("Failed to parse CSV");
    assert_eq!(issues.len(), 6);

    let params = ClusterParams {
        min_cluster_size: 2,
        jaccard_threshold: 0.4,
        min_shared_tokens: 2,
        ..ClusterParams::default()
    };
    let clusters = find_similar_issue_clusters(&issues, &params).unwrap();

    // A-4/A-5 are identical titles and cluster too; A-1/A-2 is the near-duplicate
    let near = clusters
        .iter()
        .find(|c| c.keys.contains("A-1"))
        .expect("A-1 should be clustered");
    assert_eq!(near.size, 2);
    assert!(near.keys.contains("A-2"));
    assert!(!near.keys.contains("A-3"));
}

#[test]
fn test_duplicates_report_workflow() {
    let issues = parse_issues_csv(jira_export().as_bytes()).unwrap();
    let report = build_duplicates_report(&issues, &ClusterParams::default()).unwrap();

    assert_eq!(report.title_groups.len(), 1);
    assert_eq!(report.title_groups[0].keys, vec!["A-4", "A-5"]);

    // The exact pair is not repeated as a heuristic cluster
    assert_eq!(report.clusters.len(), 1);
    assert!(report.clusters[0].keys.contains("A-1"));
}

// =============================================================================
// Insights
// =============================================================================

#[test]
fn test_insights_from_import() {
    let issues = parse_issues_csv(jira_export().as_bytes()).unwrap();
    let open = open_only(&issues);
    assert_eq!(open.len(), 5);

    let insights = build_chart_insights("open_status_bar", &issues, &open);
    assert!(insights
        .iter()
        .all(|i| !i.title.to_lowercase().contains("bottleneck")));
    assert!(insights[0].body.contains("not interpreted as a bottleneck"));
    assert!(insights[0].body.contains("Accepted"));

    assert_eq!(exit_funnel_counts(&issues), (3, 1, 4));

    for chart in ["timeseries", "age_buckets", "resolution_hist", "open_priority_pie"] {
        let insights = build_chart_insights(chart, &issues, &open);
        assert!(!insights.is_empty(), "no insights for {}", chart);
        assert!(insights.iter().all(|i| i.chart_id == chart));
    }
}

// =============================================================================
// Learning Store
// =============================================================================

#[test]
fn test_rotation_persists_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("insights_learning.json");

    let issues = parse_issues_csv(jira_export().as_bytes()).unwrap();
    let open = open_only(&issues);
    let insights = build_chart_insights("open_status_bar", &issues, &open);
    let rotation = InsightRotation {
        max_visible: 1,
        max_repeats: 1,
    };
    let scope = learning_scope_key("Mexico", "jira:mexico:core");

    // First session
    let mut store = LearningStore::open(&path);
    let (mut state, interactions) = store.get_scope(&scope);
    assert_eq!((state.clone(), interactions), (ScopeState::new(), 0));
    let first = rotation.select(&insights, &mut state);
    store.set_scope(
        Some(scope.as_str()),
        state,
        interactions + 1,
        "Mexico",
        "jira:mexico:core",
        None,
    );
    assert!(store.save().unwrap());

    // Second session sees a different insight
    let mut store = LearningStore::open(&path);
    let (mut state, interactions) = store.get_scope(&scope);
    assert_eq!(interactions, 1);
    let second = rotation.select(&insights, &mut state);
    assert_ne!(first[0].id, second[0].id);

    store.set_scope(Some(scope.as_str()), state, interactions + 1, "Mexico", "jira:mexico:core", None);
    store.save().unwrap();
    assert_eq!(store.count_source_scopes("jira:mexico:core"), 1);
    assert_eq!(store.remove_source("jira:mexico:core"), 1);
    store.save().unwrap();

    assert!(LearningStore::open(&path).is_empty());
}
