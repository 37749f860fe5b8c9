//! Insight rotation
//!
//! Picks which insights to surface for a scope so the same observation is not
//! repeated forever. The number of times each insight was shown lives in the
//! scope state under `shown_counts`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::insights::Insight;
use crate::learning::{lenient_count, ScopeState};

/// Key of the per-insight counters inside a scope state
pub const SHOWN_COUNTS_KEY: &str = "shown_counts";

/// Rotation limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightRotation {
    /// Most insights surfaced per view
    pub max_visible: usize,
    /// Views after which an insight is suppressed
    pub max_repeats: u64,
}

impl Default for InsightRotation {
    fn default() -> Self {
        Self {
            max_visible: 4,
            max_repeats: 3,
        }
    }
}

impl InsightRotation {
    pub fn validate(&self) -> Result<()> {
        if self.max_visible == 0 {
            return Err(Error::InvalidConfig(
                "rotation.max_visible must be at least 1".into(),
            ));
        }
        if self.max_repeats == 0 {
            return Err(Error::InvalidConfig(
                "rotation.max_repeats must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Select the insights to show and record that they were shown.
    ///
    /// Candidates are ordered by how often they were already shown (least
    /// first, ties keep the rule order). Insights shown `max_repeats` times or
    /// more are suppressed, unless every candidate is, in which case the least
    /// shown resurface.
    pub fn select(&self, insights: &[Insight], state: &mut ScopeState) -> Vec<Insight> {
        let mut ranked: Vec<(u64, &Insight)> = insights
            .iter()
            .map(|i| (shown_count(state, &i.id), i))
            .collect();
        ranked.sort_by_key(|(count, _)| *count);

        let fresh: Vec<&Insight> = ranked
            .iter()
            .filter(|(count, _)| *count < self.max_repeats)
            .map(|(_, i)| *i)
            .collect();
        let pool: Vec<&Insight> = if fresh.is_empty() {
            ranked.iter().map(|(_, i)| *i).collect()
        } else {
            fresh
        };

        let selected: Vec<Insight> = pool.into_iter().take(self.max_visible).cloned().collect();
        for insight in &selected {
            record_shown(state, &insight.id);
        }
        selected
    }
}

/// Times an insight was shown in this scope
pub fn shown_count(state: &ScopeState, insight_id: &str) -> u64 {
    state
        .get(SHOWN_COUNTS_KEY)
        .and_then(Value::as_object)
        .and_then(|counts| counts.get(insight_id))
        .map(lenient_count)
        .unwrap_or(0)
}

fn record_shown(state: &mut ScopeState, insight_id: &str) {
    let next = shown_count(state, insight_id) + 1;
    let counts = state
        .entry(SHOWN_COUNTS_KEY)
        .or_insert_with(|| Value::Object(Map::new()));
    if !counts.is_object() {
        *counts = Value::Object(Map::new());
    }
    if let Value::Object(map) = counts {
        map.insert(insight_id.to_string(), Value::from(next));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::{ChartId, Insight};
    use serde_json::json;

    fn candidates(n: usize) -> Vec<Insight> {
        (0..n)
            .map(|i| Insight::info(ChartId::OpenStatusBar, &format!("r{}", i), "t", "b"))
            .collect()
    }

    fn ids(insights: &[Insight]) -> Vec<&str> {
        insights.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_select_caps_and_counts() {
        let rotation = InsightRotation {
            max_visible: 2,
            max_repeats: 3,
        };
        let mut state = ScopeState::new();
        let shown = rotation.select(&candidates(3), &mut state);
        assert_eq!(ids(&shown), vec!["open_status_bar.r0", "open_status_bar.r1"]);
        assert_eq!(shown_count(&state, "open_status_bar.r0"), 1);
        assert_eq!(shown_count(&state, "open_status_bar.r2"), 0);

        // Least shown comes first next time
        let shown = rotation.select(&candidates(3), &mut state);
        assert_eq!(ids(&shown), vec!["open_status_bar.r2", "open_status_bar.r0"]);
    }

    #[test]
    fn test_repeated_insights_are_suppressed() {
        let rotation = InsightRotation {
            max_visible: 4,
            max_repeats: 2,
        };
        let mut state = ScopeState::new();
        state.insert(
            SHOWN_COUNTS_KEY.into(),
            json!({"open_status_bar.r0": 2, "open_status_bar.r1": 1}),
        );
        let shown = rotation.select(&candidates(2), &mut state);
        assert_eq!(ids(&shown), vec!["open_status_bar.r1"]);
        assert_eq!(shown_count(&state, "open_status_bar.r1"), 2);
    }

    #[test]
    fn test_everything_suppressed_resurfaces_least_shown() {
        let rotation = InsightRotation {
            max_visible: 1,
            max_repeats: 1,
        };
        let mut state = ScopeState::new();
        state.insert(
            SHOWN_COUNTS_KEY.into(),
            json!({"open_status_bar.r0": 5, "open_status_bar.r1": 2}),
        );
        let shown = rotation.select(&candidates(2), &mut state);
        assert_eq!(ids(&shown), vec!["open_status_bar.r1"]);
        assert_eq!(shown_count(&state, "open_status_bar.r1"), 3);
    }

    #[test]
    fn test_float_counts_are_honoured() {
        let rotation = InsightRotation {
            max_visible: 1,
            max_repeats: 2,
        };
        let mut state = ScopeState::new();
        state.insert(
            SHOWN_COUNTS_KEY.into(),
            json!({"open_status_bar.r0": 2.0, "open_status_bar.r1": 1.0}),
        );
        assert_eq!(shown_count(&state, "open_status_bar.r0"), 2);

        let shown = rotation.select(&candidates(2), &mut state);
        assert_eq!(ids(&shown), vec!["open_status_bar.r1"]);
        assert_eq!(shown_count(&state, "open_status_bar.r1"), 2);
    }

    #[test]
    fn test_malformed_counts_are_reset() {
        let mut state = ScopeState::new();
        state.insert(SHOWN_COUNTS_KEY.into(), json!("oops"));
        let shown = InsightRotation::default().select(&candidates(1), &mut state);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown_count(&state, "open_status_bar.r0"), 1);
    }

    #[test]
    fn test_validate() {
        assert!(InsightRotation::default().validate().is_ok());
        let zero = InsightRotation {
            max_visible: 0,
            max_repeats: 1,
        };
        assert!(matches!(zero.validate(), Err(Error::InvalidConfig(_))));
    }
}
