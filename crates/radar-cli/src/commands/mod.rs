//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `duplicates` - Exact title repeats and similarity clusters
//! - `insights` - Chart insights rotated through the learning store
//! - `funnel` - Exit funnel counts
//! - `learning` - Learning store inspection and pruning
//!
//! Shared helpers for loading exports and narrowing them to a scope live here.

pub mod duplicates;
pub mod funnel;
pub mod insights;
pub mod learning;

// Re-export command functions for main.rs
pub use duplicates::*;
pub use funnel::*;
pub use insights::*;
pub use learning::*;

use std::path::Path;

use anyhow::{Context, Result};
use radar_core::{learning_scope_key, load_issues, Issue, Settings, StatusTaxonomy};

/// Load an issue export, naming the file on failure
pub fn load_export(file: &Path) -> Result<Vec<Issue>> {
    load_issues(file).with_context(|| format!("Failed to load issues from {}", file.display()))
}

/// Status taxonomy from the settings override, the user data dir or the builtin
pub fn load_taxonomy(settings: &Settings) -> Result<StatusTaxonomy> {
    StatusTaxonomy::load(settings.status_taxonomy_path.as_deref())
        .context("Failed to load status taxonomy")
}

/// Country/source selection applied to an export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeFilter {
    pub country: Option<String>,
    pub source: Option<String>,
}

impl ScopeFilter {
    /// Build a filter; blank values select everything
    pub fn new(country: Option<String>, source: Option<String>) -> Self {
        let clean = |v: Option<String>| {
            v.map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        Self {
            country: clean(country),
            source: clean(source),
        }
    }

    /// Country matches ignore case, source ids must match exactly
    pub fn matches(&self, issue: &Issue) -> bool {
        let country_ok = match &self.country {
            Some(c) => issue
                .country
                .as_deref()
                .is_some_and(|ic| ic.trim().eq_ignore_ascii_case(c)),
            None => true,
        };
        let source_ok = match &self.source {
            Some(s) => issue.source_id.as_deref().map(str::trim) == Some(s.as_str()),
            None => true,
        };
        country_ok && source_ok
    }

    pub fn apply(&self, issues: &[Issue]) -> Vec<Issue> {
        issues.iter().filter(|i| self.matches(i)).cloned().collect()
    }

    /// Same selection with the country spelled as in the matched rows, so
    /// `mexico` and `Mexico` share one learning scope
    pub fn canonical(&self, rows: &[Issue]) -> Self {
        let country = self.country.as_ref().map(|wanted| {
            rows.iter()
                .filter_map(|i| i.country.as_deref().map(str::trim))
                .find(|c| c.eq_ignore_ascii_case(wanted))
                .unwrap_or(wanted.as_str())
                .to_string()
        });
        Self {
            country,
            source: self.source.clone(),
        }
    }

    pub fn country_str(&self) -> &str {
        self.country.as_deref().unwrap_or("")
    }

    pub fn source_str(&self) -> &str {
        self.source.as_deref().unwrap_or("")
    }

    /// Learning store key for this selection
    pub fn scope_key(&self) -> String {
        learning_scope_key(self.country_str(), self.source_str())
    }
}

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
