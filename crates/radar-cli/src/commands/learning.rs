//! Learning store commands (show, remove-source)

use std::io::{self, Write};

use anyhow::Result;
use radar_core::learning::ScopeRecord;
use radar_core::rotation::SHOWN_COUNTS_KEY;
use radar_core::{learning_scope_key, LearningStore, Settings};
use serde_json::Value;

use super::truncate;

fn print_scope_detail(key: &str, record: &ScopeRecord) {
    println!("\n🧠 Learning scope: {}", key);
    println!("   ─────────────────────────────────────────────");
    println!("   Interactions: {}", record.interactions);
    if let Some(updated) = record.updated_at {
        println!("   Updated:      {}", updated.format("%Y-%m-%d %H:%M UTC"));
    }

    let counts = record
        .state
        .get(SHOWN_COUNTS_KEY)
        .and_then(Value::as_object)
        .filter(|c| !c.is_empty());
    match counts {
        Some(counts) => {
            println!("\n   {:<45} {:>6}", "Insight", "Shown");
            for (id, count) in counts {
                println!(
                    "   {:<45} {:>6}",
                    truncate(id, 45),
                    count.as_u64().unwrap_or(0)
                );
            }
        }
        None => println!("\n   No insights shown yet."),
    }
}

/// Look a scope up by key, ignoring the case of its country part
pub fn find_scope<'a>(store: &'a LearningStore, key: &str) -> Option<(&'a str, &'a ScopeRecord)> {
    let (country, source) = key.split_once("::")?;
    store.scopes().find(|(stored, _)| {
        stored
            .split_once("::")
            .is_some_and(|(c, s)| s == source && c.eq_ignore_ascii_case(country))
    })
}

/// Show one scope (when a country or source is given) or list them all
pub fn cmd_learning_show(
    settings: &Settings,
    country: Option<&str>,
    source: Option<&str>,
) -> Result<()> {
    let store = LearningStore::open(settings.learning_path());

    if country.is_some() || source.is_some() {
        let key = learning_scope_key(country.unwrap_or(""), source.unwrap_or(""));
        match find_scope(&store, &key) {
            Some((stored, record)) => print_scope_detail(stored, record),
            None => println!("No learning state recorded for scope {}", key),
        }
        return Ok(());
    }

    if store.is_empty() {
        println!("No learning state in {}", store.path().display());
        return Ok(());
    }

    println!(
        "\n🧠 Learning Store ({} scopes) - {}",
        store.len(),
        store.path().display()
    );
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   {:<40} {:>12}  {}", "Scope", "Interactions", "Updated");
    for (key, record) in store.scopes() {
        let updated = record
            .updated_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "   {:<40} {:>12}  {}",
            truncate(key, 40),
            record.interactions,
            updated
        );
    }

    Ok(())
}

/// Remove every scope of a source from the learning store
pub fn cmd_learning_remove_source(settings: &Settings, source_id: &str, yes: bool) -> Result<()> {
    let mut store = LearningStore::open(settings.learning_path());

    let count = store.count_source_scopes(source_id);
    if count == 0 {
        println!("No learning scopes recorded for source {}", source_id.trim());
        return Ok(());
    }

    if !yes {
        print!(
            "⚠️  This will delete {} learning scope(s) for source {}.\n\n",
            count,
            source_id.trim()
        );
        print!("Are you sure? [y/N] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let removed = store.remove_source(source_id);
    store.save()?;
    println!("✅ Removed {} learning scope(s) for {}", removed, source_id.trim());

    Ok(())
}
