//! Domain models for Radar

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single issue row as exported by one of the source trackers.
///
/// Every column is optional: an absent column in the export and an empty cell
/// are the same thing to the analysis code, which treats both as "no data"
/// rather than as an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub key: Option<String>,
    pub summary: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    /// Resolution timestamp; `None` means the issue is still open
    pub resolved: Option<DateTime<Utc>>,
    /// Tracker source, e.g. `jira:mexico:core`
    pub source_id: Option<String>,
    pub country: Option<String>,
}

impl Issue {
    /// Create an open issue with a key and summary
    pub fn new(key: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            summary: Some(summary.into()),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    pub fn with_resolved(mut self, resolved: DateTime<Utc>) -> Self {
        self.resolved = Some(resolved);
        self
    }

    pub fn is_open(&self) -> bool {
        self.resolved.is_none()
    }

    /// Trimmed, non-empty key
    pub fn key_str(&self) -> Option<&str> {
        non_blank(self.key.as_deref())
    }

    /// Trimmed, non-empty status
    pub fn status_str(&self) -> Option<&str> {
        non_blank(self.status.as_deref())
    }

    /// Trimmed, non-empty priority
    pub fn priority_str(&self) -> Option<&str> {
        non_blank(self.priority.as_deref())
    }

    /// Age in days at `now`, clamped at zero
    pub fn age_days(&self, now: DateTime<Utc>) -> Option<f64> {
        self.created.map(|created| days_between(created, now))
    }

    /// Days from creation to resolution, for closed issues with both dates
    pub fn resolution_days(&self) -> Option<f64> {
        match (self.created, self.resolved) {
            (Some(created), Some(resolved)) => Some(days_between(created, resolved)),
            _ => None,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Fractional days between two instants, never negative
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let secs = (to - from).num_seconds() as f64;
    (secs / 86_400.0).max(0.0)
}

/// Keep only open issues (no resolution timestamp)
pub fn open_only(issues: &[Issue]) -> Vec<Issue> {
    issues.iter().filter(|i| i.is_open()).cloned().collect()
}

/// Jira priority names, highest first
const PRIORITY_ORDER: [&str; 5] = ["highest", "high", "medium", "low", "lowest"];

/// Rank of a priority name, lower is more urgent.
///
/// Unknown names rank after every known one.
pub fn priority_rank(priority: &str) -> u8 {
    let normalized = priority.trim().to_lowercase();
    PRIORITY_ORDER
        .iter()
        .position(|p| *p == normalized)
        .map(|pos| pos as u8)
        .unwrap_or(99)
}

/// Highest and High
pub fn is_high_priority(priority: &str) -> bool {
    priority_rank(priority) <= 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_priority_rank() {
        assert_eq!(priority_rank("Highest"), 0);
        assert_eq!(priority_rank(" high "), 1);
        assert_eq!(priority_rank("Lowest"), 4);
        assert_eq!(priority_rank("P1"), 99);
        assert!(is_high_priority("High"));
        assert!(!is_high_priority("Medium"));
    }

    #[test]
    fn test_blank_fields_are_absent() {
        let issue = Issue::new("  ", "x").with_status("   ");
        assert_eq!(issue.key_str(), None);
        assert_eq!(issue.status_str(), None);
    }

    #[test]
    fn test_age_and_resolution_days() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let resolved = Utc.with_ymd_and_hms(2024, 1, 11, 12, 0, 0).unwrap();
        let issue = Issue::new("A-1", "x")
            .with_created(created)
            .with_resolved(resolved);

        assert!(!issue.is_open());
        assert_eq!(issue.resolution_days(), Some(10.5));
        // Creation in the future clamps to zero
        let before = Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap();
        assert_eq!(issue.age_days(before), Some(0.0));
    }

    #[test]
    fn test_open_only() {
        let now = Utc::now();
        let issues = vec![
            Issue::new("A-1", "open"),
            Issue::new("A-2", "closed").with_resolved(now),
        ];
        let open = open_only(&issues);
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].key_str(), Some("A-1"));
    }
}
