//! Exit funnel command

use std::path::Path;

use anyhow::Result;
use radar_core::insights::exit_funnel_counts_with;
use radar_core::Settings;

use super::{load_export, load_taxonomy};

pub fn cmd_funnel(settings: &Settings, file: &Path) -> Result<()> {
    let issues = load_export(file)?;
    let taxonomy = load_taxonomy(settings)?;
    let (accepted, ready, total) = exit_funnel_counts_with(&issues, &taxonomy);

    println!("\n📊 Exit Funnel ({} issues)", issues.len());
    println!("   ─────────────────────────────");
    println!("   Accepted:         {:>6}", accepted);
    println!("   Ready to Deploy:  {:>6}", ready);
    println!("   ─────────────────────────────");
    println!("   Waiting to exit:  {:>6}", total);

    if total == 0 {
        println!("\n   No issues are waiting in the exit stages.");
    }

    Ok(())
}
