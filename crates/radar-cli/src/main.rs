//! Radar CLI - Bug Resolution Radar analysis from the terminal
//!
//! Usage:
//!   radar duplicates --file issues.csv              Report duplicate issues
//!   radar insights --file issues.csv --chart ID     Rotate chart insights
//!   radar funnel --file issues.csv                  Show exit funnel counts
//!   radar learning show                             Inspect the learning store

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use radar_core::Settings;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Duplicates {
            file,
            include_closed,
            min_size,
            jaccard,
            min_shared,
            max_issues,
            json,
        } => {
            let params = commands::cluster_params(
                &settings.clusters,
                include_closed,
                min_size,
                jaccard,
                min_shared,
                max_issues,
            );
            commands::cmd_duplicates(&file, &params, json)
        }
        Commands::Insights {
            file,
            chart,
            country,
            source,
            all,
            json,
        } => {
            let scope = commands::ScopeFilter::new(country, source);
            commands::cmd_insights(&settings, &file, &chart, &scope, all, json).map(|_| ())
        }
        Commands::Funnel { file } => commands::cmd_funnel(&settings, &file),
        Commands::Learning { action } => match action {
            LearningAction::Show { country, source } => {
                commands::cmd_learning_show(&settings, country.as_deref(), source.as_deref())
            }
            LearningAction::RemoveSource { source_id, yes } => {
                commands::cmd_learning_remove_source(&settings, &source_id, yes)
            }
        },
    }
}
