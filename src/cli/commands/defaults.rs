//! CLI command for `rpem defaults update`

use anyhow::{Context, Result};

use crate::cli::output::status;
use crate::cli::Session;

/// Execute the defaults update command
pub fn execute_update(session: &Session) -> Result<()> {
    let mut registry = session.open_registry()?;
    let report = registry
        .update_defaults()
        .context("Failed to update defaults")?;

    if session.quiet() {
        return Ok(());
    }

    match &report.previous_version {
        Some(previous) if *previous != report.version => println!(
            "{} Defaults updated from catalog {previous} to {}",
            status::SUCCESS,
            report.version
        ),
        _ => println!(
            "{} Defaults refreshed from catalog {}",
            status::SUCCESS,
            report.version
        ),
    }

    for (kind, id) in &report.shadowed {
        println!(
            "{} Your {kind} '{id}' replaces the catalog entry with the same id",
            status::WARNING
        );
    }
    for dangling in &report.dangling {
        println!("{} {dangling}", status::WARNING);
    }

    Ok(())
}
