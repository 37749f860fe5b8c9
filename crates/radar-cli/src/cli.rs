//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Radar - Find duplicate bugs and explain the backlog
#[derive(Parser)]
#[command(name = "radar")]
#[command(about = "Bug Resolution Radar: duplicate detection and chart insights", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Settings file
    ///
    /// Defaults to config.toml in the radar data directory
    /// (~/.local/share/radar on Linux) when it exists.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Report exact title repeats and clusters of similar issues
    Duplicates {
        /// Issue export (.csv or .json)
        #[arg(short, long)]
        file: PathBuf,

        /// Include resolved issues
        #[arg(long)]
        include_closed: bool,

        /// Smallest cluster worth reporting
        #[arg(long)]
        min_size: Option<usize>,

        /// Minimum Jaccard similarity to link two issues (0.0-1.0)
        #[arg(long)]
        jaccard: Option<f64>,

        /// Minimum number of shared tokens to link two issues
        #[arg(long)]
        min_shared: Option<usize>,

        /// Only consider the first N issues
        #[arg(long)]
        max_issues: Option<usize>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show insights for one chart, rotated through the learning store
    Insights {
        /// Issue export (.csv or .json)
        #[arg(short, long)]
        file: PathBuf,

        /// Chart id: timeseries, age_buckets, resolution_hist,
        /// open_priority_pie, open_status_bar, exit_funnel
        #[arg(short, long)]
        chart: String,

        /// Only analyze issues from this country
        #[arg(long)]
        country: Option<String>,

        /// Only analyze issues from this source id
        #[arg(long)]
        source: Option<String>,

        /// Show every insight, skipping rotation (the learning store is not touched)
        #[arg(long)]
        all: bool,

        /// Print the insights as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show Accepted -> Ready to Deploy -> Deployed counts
    Funnel {
        /// Issue export (.csv or .json)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Inspect or prune the insights learning store
    Learning {
        #[command(subcommand)]
        action: LearningAction,
    },
}

#[derive(Subcommand)]
pub enum LearningAction {
    /// Show stored scopes (all of them, or the one for a country/source)
    Show {
        /// Country of the scope
        #[arg(long)]
        country: Option<String>,

        /// Source id of the scope
        #[arg(long)]
        source: Option<String>,
    },

    /// Delete every scope recorded for a source
    RemoveSource {
        /// Source id (e.g. "jira:mexico:core")
        source_id: String,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}
