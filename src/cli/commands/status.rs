//! CLI command for `rpem status`

use anyhow::Result;

use crate::cli::output::status;
use crate::cli::Session;
use crate::core::model::ResourceKind;
use crate::core::status::{data_status, format_size};

/// Execute the status command
pub fn execute(session: &Session) -> Result<()> {
    let registry = session.open_registry()?;
    let state = registry.state();
    let layout = registry.layout();

    println!("Data directory: {}", layout.root().display());
    println!("State file: {}", layout.state_file().display());

    let shipped = registry.catalog().version();
    match &state.catalog_version {
        Some(seeded) if seeded < shipped => println!(
            "Catalog: {seeded} (catalog {shipped} available, run 'rpem defaults update')"
        ),
        Some(seeded) => println!("Catalog: {seeded}"),
        None => println!("Catalog: unknown (run 'rpem defaults update')"),
    }
    println!();

    for kind in ResourceKind::ALL {
        let (total, user) = state.count(kind);
        match kind {
            ResourceKind::Hardware => println!("Hardware: {total} ({user} user)"),
            ResourceKind::Os => println!("Operating systems: {total} ({user} user)"),
            ResourceKind::Image => println!("Images: {total}"),
            ResourceKind::Firmware => println!("Firmware: {total} ({user} user)"),
        }
    }
    if let Some(last) = registry.last_image() {
        println!("Last image: {last}");
    }
    println!();

    let usage = data_status(layout, state);
    println!(
        "Images on disk: {} in {} file(s)",
        format_size(usage.images.size_bytes),
        usage.images.file_count
    );
    println!(
        "Firmware on disk: {} in {} file(s)",
        format_size(usage.firmware.size_bytes),
        usage.firmware.file_count
    );
    println!("Total: {}", format_size(usage.total_bytes()));

    if !usage.untracked.is_empty() {
        println!();
        println!(
            "{} {} file(s) not tracked by any entry:",
            status::WARNING,
            usage.untracked.len()
        );
        for path in &usage.untracked {
            println!("    {}", path.display());
        }
    }

    for dangling in state.dangling_references() {
        println!("{} {dangling}", status::WARNING);
    }

    Ok(())
}
