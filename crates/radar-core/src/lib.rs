//! Radar Core Library
//!
//! Analysis core for Bug Resolution Radar:
//! - Issue import from CSV and JSON exports
//! - Summary tokenization and near-duplicate clustering
//! - Exact title duplicate report
//! - Status taxonomy with terminal-stage awareness
//! - Chart insight rules (flow, age, resolution, priority, status, exit funnel)
//! - Per-scope learning store and insight rotation
//! - Settings resolution

pub mod cluster;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod import;
pub mod insights;
pub mod learning;
pub mod models;
pub mod rotation;
pub mod status;
pub mod tokenize;

pub use cluster::{find_similar_issue_clusters, jaccard, ClusterParams, IssueCluster};
pub use config::Settings;
pub use duplicates::{build_duplicates_report, exact_title_groups, DuplicatesReport, TitleGroup};
pub use error::{Error, Result};
pub use import::{load_issues, parse_issues_csv, parse_issues_json};
pub use insights::{
    build_chart_insights, exit_funnel_counts, ChartId, Insight, InsightContext, InsightEngine,
    InsightLevel,
};
pub use learning::{default_learning_path, learning_scope_key, LearningStore, ScopeState};
pub use models::{open_only, Issue};
pub use rotation::InsightRotation;
pub use status::{StatusStage, StatusTaxonomy};
pub use tokenize::tokenize;
