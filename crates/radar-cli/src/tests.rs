//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::path::{Path, PathBuf};

use radar_core::{ClusterParams, InsightRotation, LearningStore, Settings};
use tempfile::TempDir;

use crate::commands::{self, truncate, ScopeFilter};

/// Jira-like export with one near-duplicate pair (A-1/A-2), one exact title
/// pair (A-4/A-5), a Spain issue and a deployed issue
const EXPORT: &str = "\
key,summary,status,priority,created,resolved,source_id,country
A-1,Payment API timeout when submitting transfer,Accepted,High,2024-05-01,,jira:mexico:core,Mexico
A-2,Payment API timeout while submitting transfer,Accepted,High,2024-05-02,,jira:mexico:core,Mexico
A-3,Dark mode colors wrong in settings screen,Accepted,Low,2024-05-03,,jira:mexico:core,Mexico
A-4,Export button missing on reports page,Ready to Deploy,Medium,2024-05-04,,jira:mexico:core,Mexico
A-5,Export button missing on reports page,New,Medium,2024-05-05,,jira:mexico:core,Mexico
A-6,Session expires too early on mobile app,Deployed,Low,2024-05-01,2024-05-20,jira:mexico:core,Mexico
B-1,Card declined message is unclear,Analysing,High,2024-05-06,,jira:spain:cards,Spain
";

/// Temp dir holding the export, plus settings whose learning store lives there
fn setup() -> (TempDir, PathBuf, Settings) {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("issues.csv");
    std::fs::write(&file, EXPORT).unwrap();
    let settings = Settings {
        insights_learning_path: Some(dir.path().join("learning").join("insights_learning.json")),
        ..Settings::default()
    };
    (dir, file, settings)
}

fn mexico() -> ScopeFilter {
    ScopeFilter::new(Some("mexico".into()), Some("jira:mexico:core".into()))
}

fn learning_store(settings: &Settings) -> LearningStore {
    LearningStore::open(settings.learning_path())
}

fn learning_file(settings: &Settings) -> PathBuf {
    settings.learning_path()
}

// ========== Shared Helper Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a long string that exceeds", 10), "a long ...");
    assert_eq!(truncate("exact", 5), "exact");
    assert_eq!(truncate("toolong", 6), "too...");
    assert_eq!(truncate("añadir botón", 8), "añadi...");
}

#[test]
fn test_scope_filter() {
    let issues = commands::load_export(&setup().1).unwrap();

    let all = ScopeFilter::new(None, Some("  ".into()));
    assert_eq!(all, ScopeFilter::default());
    assert_eq!(all.apply(&issues).len(), 7);
    assert_eq!(all.scope_key(), "global::all-sources");

    let mx = mexico();
    assert_eq!(mx.apply(&issues).len(), 6);
    assert_eq!(mx.scope_key(), "mexico::jira:mexico:core");

    let spain = ScopeFilter::new(Some("SPAIN".into()), None);
    let rows = spain.apply(&issues);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].key_str(), Some("B-1"));
    assert_eq!(spain.scope_key(), "SPAIN::all-sources");
}

#[test]
fn test_load_export_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = commands::load_export(&dir.path().join("nope.csv")).unwrap_err();
    assert!(err.to_string().contains("nope.csv"));
}

// ========== Duplicates Command Tests ==========

#[test]
fn test_cluster_params_overrides() {
    let base = ClusterParams::default();
    assert_eq!(
        commands::cluster_params(&base, false, None, None, None, None),
        base
    );

    let params = commands::cluster_params(&base, true, Some(3), Some(0.4), Some(2), Some(50));
    assert!(!params.only_open);
    assert_eq!(params.min_cluster_size, 3);
    assert_eq!(params.jaccard_threshold, 0.4);
    assert_eq!(params.min_shared_tokens, 2);
    assert_eq!(params.max_issues, Some(50));
}

#[test]
fn test_cmd_duplicates() {
    let (_dir, file, settings) = setup();
    let params = commands::cluster_params(&settings.clusters, false, None, Some(0.4), Some(2), None);
    assert!(commands::cmd_duplicates(&file, &params, false).is_ok());
    assert!(commands::cmd_duplicates(&file, &params, true).is_ok());
}

#[test]
fn test_cmd_duplicates_rejects_bad_threshold() {
    let (_dir, file, settings) = setup();
    let params = commands::cluster_params(&settings.clusters, false, None, Some(1.5), None, None);
    assert!(commands::cmd_duplicates(&file, &params, false).is_err());
}

// ========== Funnel Command Tests ==========

#[test]
fn test_cmd_funnel() {
    let (_dir, file, settings) = setup();
    assert!(commands::cmd_funnel(&settings, &file).is_ok());
    assert!(commands::cmd_funnel(&settings, Path::new("missing.json")).is_err());
}

// ========== Insights Command Tests ==========

#[test]
fn test_cmd_insights_unknown_chart() {
    let (_dir, file, settings) = setup();
    let result = commands::cmd_insights(&settings, &file, "pie_of_doom", &mexico(), false, false);
    assert!(result.is_err());
    assert!(!learning_file(&settings).exists());
}

#[test]
fn test_cmd_insights_all_skips_learning_store() {
    let (_dir, file, settings) = setup();
    let shown =
        commands::cmd_insights(&settings, &file, "open_status_bar", &mexico(), true, true).unwrap();
    assert!(!shown.is_empty());
    assert!(shown.iter().all(|i| i.chart_id == "open_status_bar"));
    assert!(!learning_file(&settings).exists());
}

#[test]
fn test_cmd_insights_rotates_between_runs() {
    let (_dir, file, mut settings) = setup();
    settings.rotation = InsightRotation {
        max_visible: 1,
        max_repeats: 1,
    };

    let first =
        commands::cmd_insights(&settings, &file, "open_status_bar", &mexico(), false, false)
            .unwrap();
    let second =
        commands::cmd_insights(&settings, &file, "open_status_bar", &mexico(), false, false)
            .unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_ne!(first[0].id, second[0].id);

    let store = learning_store(&settings);
    let (state, interactions) = store.get_scope("Mexico::jira:mexico:core");
    assert_eq!(interactions, 2);
    assert!(state.contains_key("shown_counts"));

    let record = store.record("Mexico::jira:mexico:core").unwrap();
    assert_eq!(record.country, "Mexico");
    assert_eq!(record.source_id, "jira:mexico:core");
}

#[test]
fn test_cmd_insights_country_spelling_shares_scope() {
    let (_dir, file, settings) = setup();
    let lower = ScopeFilter::new(Some("mexico".into()), None);
    let upper = ScopeFilter::new(Some("MEXICO".into()), None);

    commands::cmd_insights(&settings, &file, "open_status_bar", &lower, false, false).unwrap();
    commands::cmd_insights(&settings, &file, "open_status_bar", &upper, false, false).unwrap();

    let store = learning_store(&settings);
    assert_eq!(store.len(), 1);
    assert_eq!(store.get_scope("Mexico::all-sources").1, 2);

    let (key, record) = commands::find_scope(&store, "mexico::all-sources").unwrap();
    assert_eq!(key, "Mexico::all-sources");
    assert_eq!(record.interactions, 2);
    assert!(commands::find_scope(&store, "mexico::jira:mexico:core").is_none());
}

#[test]
fn test_scope_filter_canonical_country() {
    let issues = commands::load_export(&setup().1).unwrap();
    let filter = ScopeFilter::new(Some("SPAIN".into()), None);
    let rows = filter.apply(&issues);
    assert_eq!(filter.canonical(&rows).scope_key(), "Spain::all-sources");
    // Nothing matched: the given spelling is kept
    assert_eq!(filter.canonical(&[]).scope_key(), "SPAIN::all-sources");
}

#[test]
fn test_cmd_insights_scopes_are_independent() {
    let (_dir, file, settings) = setup();
    let spain = ScopeFilter::new(Some("Spain".into()), None);

    commands::cmd_insights(&settings, &file, "age_buckets", &mexico(), false, false).unwrap();
    commands::cmd_insights(&settings, &file, "age_buckets", &spain, false, true).unwrap();

    let store = learning_store(&settings);
    assert_eq!(store.len(), 2);
    assert_eq!(store.get_scope("Spain::all-sources").1, 1);
    assert_eq!(store.get_scope("Mexico::jira:mexico:core").1, 1);
}

// ========== Learning Command Tests ==========

#[test]
fn test_cmd_learning_show_empty_store() {
    let (_dir, _file, settings) = setup();
    assert!(commands::cmd_learning_show(&settings, None, None).is_ok());
    assert!(commands::cmd_learning_show(&settings, Some("Mexico"), None).is_ok());
}

#[test]
fn test_cmd_learning_show_after_insights() {
    let (_dir, file, settings) = setup();
    commands::cmd_insights(&settings, &file, "timeseries", &mexico(), false, false).unwrap();

    assert!(commands::cmd_learning_show(&settings, None, None).is_ok());
    assert!(
        commands::cmd_learning_show(&settings, Some("mexico"), Some("jira:mexico:core")).is_ok()
    );
}

#[test]
fn test_cmd_learning_remove_source() {
    let (_dir, file, settings) = setup();
    let spain = ScopeFilter::new(Some("Spain".into()), Some("jira:spain:cards".into()));
    commands::cmd_insights(&settings, &file, "exit_funnel", &mexico(), false, false).unwrap();
    commands::cmd_insights(&settings, &file, "exit_funnel", &spain, false, false).unwrap();
    assert_eq!(learning_store(&settings).len(), 2);

    commands::cmd_learning_remove_source(&settings, "jira:mexico:core", true).unwrap();

    let store = learning_store(&settings);
    assert_eq!(store.len(), 1);
    assert_eq!(store.count_source_scopes("jira:mexico:core"), 0);
    assert_eq!(store.count_source_scopes("jira:spain:cards"), 1);
}

#[test]
fn test_cmd_learning_remove_unknown_source() {
    let (_dir, _file, settings) = setup();
    assert!(commands::cmd_learning_remove_source(&settings, "jira:nowhere", false).is_ok());
    assert!(!learning_file(&settings).exists());
}
