//! Insight Engine - narrative insights for backlog charts
//!
//! Every chart on the dashboard has a rule that reads the filtered issue
//! collection and returns a few short observations: what stands out, what
//! deserves attention, and what is healthy. Rules are registered per chart in
//! the [`InsightEngine`]; unknown charts get a neutral placeholder.
//!
//! ## Chart Rules
//!
//! - **Flow** (`timeseries`) - inflow vs outflow, runway, spikes
//! - **Backlog Age** (`age_buckets`) - percentiles and the long tail
//! - **Resolution Time** (`resolution_hist`) - closing speed per priority
//! - **Priority Mix** (`open_priority_pie`) - concentration and urgency inflation
//! - **Open Status** (`open_status_bar`) - bottlenecks, terminal-stage aware
//! - **Exit Funnel** (`exit_funnel`) - Accepted -> Ready to Deploy -> Deployed
//!
//! ## Usage
//!
//! ```rust,ignore
//! use radar_core::insights::{InsightContext, InsightEngine};
//!
//! let engine = InsightEngine::new();
//! let ctx = InsightContext::new(&filtered, &open, &taxonomy);
//! let insights = engine.build("open_status_bar", &ctx);
//! ```

pub mod age;
pub mod engine;
pub mod exit_funnel;
pub mod flow;
pub mod priority;
pub mod resolution;
pub mod stats;
pub mod status_bar;
pub mod types;

pub use age::{age_histogram, AgeBucket, AgeBucketsRule};
pub use engine::{
    build_chart_insights, ChartRule, InsightContext, InsightEngine, MAX_INSIGHTS_PER_CHART,
};
pub use exit_funnel::{exit_funnel_counts, exit_funnel_counts_with, ExitFunnelRule};
pub use flow::{daily_flow, DailyFlow, FlowRule};
pub use priority::PriorityMixRule;
pub use resolution::ResolutionRule;
pub use stats::{status_buckets, StatusBucket};
pub use status_bar::OpenStatusRule;
pub use types::{ChartId, Insight, InsightLevel};
