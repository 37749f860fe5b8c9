//! Core types for the Insight Engine

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Charts (topics) that insight rules are registered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartId {
    /// Daily created vs resolved flow
    Timeseries,
    /// Age distribution of open issues
    AgeBuckets,
    /// Resolution time distribution of closed issues
    ResolutionHist,
    /// Priority split of open issues
    OpenPriorityPie,
    /// Status distribution of open issues
    OpenStatusBar,
    /// Accepted -> Ready to Deploy -> Deployed conversion
    ExitFunnel,
}

impl ChartId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartId::Timeseries => "timeseries",
            ChartId::AgeBuckets => "age_buckets",
            ChartId::ResolutionHist => "resolution_hist",
            ChartId::OpenPriorityPie => "open_priority_pie",
            ChartId::OpenStatusBar => "open_status_bar",
            ChartId::ExitFunnel => "exit_funnel",
        }
    }

    pub fn all() -> &'static [ChartId] {
        &[
            ChartId::Timeseries,
            ChartId::AgeBuckets,
            ChartId::ResolutionHist,
            ChartId::OpenPriorityPie,
            ChartId::OpenStatusBar,
            ChartId::ExitFunnel,
        ]
    }
}

impl fmt::Display for ChartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChartId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "timeseries" => Ok(ChartId::Timeseries),
            "age_buckets" => Ok(ChartId::AgeBuckets),
            "resolution_hist" => Ok(ChartId::ResolutionHist),
            "open_priority_pie" => Ok(ChartId::OpenPriorityPie),
            "open_status_bar" => Ok(ChartId::OpenStatusBar),
            "exit_funnel" => Ok(ChartId::ExitFunnel),
            _ => Err(format!("Unknown chart: {}", s)),
        }
    }
}

/// Tone of an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightLevel {
    /// Healthy signal
    Ok,
    /// Informational
    Info,
    /// Worth acting on
    Warn,
}

impl InsightLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightLevel::Ok => "ok",
            InsightLevel::Info => "info",
            InsightLevel::Warn => "warn",
        }
    }
}

impl fmt::Display for InsightLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A short narrative observation about one chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    /// Stable identifier, `{chart_id}.{rule}` (e.g. "open_status_bar.bottleneck")
    pub id: String,
    /// Chart or topic this insight belongs to
    pub chart_id: String,
    pub level: InsightLevel,
    pub title: String,
    pub body: String,
}

impl Insight {
    pub fn new(
        chart_id: impl Into<String>,
        rule: &str,
        level: InsightLevel,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        let chart_id = chart_id.into();
        Self {
            id: format!("{}.{}", chart_id, rule),
            chart_id,
            level,
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn info(chart: ChartId, rule: &str, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(chart.as_str(), rule, InsightLevel::Info, title, body)
    }

    pub fn warn(chart: ChartId, rule: &str, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(chart.as_str(), rule, InsightLevel::Warn, title, body)
    }

    /// `warn` when the condition holds, `info` otherwise
    pub fn warn_if(
        condition: bool,
        chart: ChartId,
        rule: &str,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        let level = if condition {
            InsightLevel::Warn
        } else {
            InsightLevel::Info
        };
        Self::new(chart.as_str(), rule, level, title, body)
    }
}
