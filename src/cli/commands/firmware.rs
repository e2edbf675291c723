//! Firmware subcommand implementations

use anyhow::{Context, Result};

use crate::cli::output::{print_artifact, progress_callback, status, yes_no};
use crate::cli::Session;
use crate::core::model::ResourceKind;
use crate::core::status::format_size;

/// Execute the firmware list command
pub fn execute_list(session: &Session) -> Result<()> {
    let registry = session.open_registry()?;
    let firmware = &registry.state().firmware;

    if firmware.is_empty() {
        println!("No firmware registered.");
        return Ok(());
    }

    println!("{:<28} {:<8} {:<12} URL", "ID", "DEFAULT", "CACHED");
    for fw in firmware.values() {
        let path = registry.layout().firmware_path(fw.id.as_str());
        let cached = std::fs::metadata(&path)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "-".to_string());
        println!(
            "{:<28} {:<8} {:<12} {}",
            fw.id,
            yes_no(fw.is_default),
            cached,
            fw.dl_link
        );
    }

    Ok(())
}

/// Execute the firmware add command
///
/// Downloads the firmware before registering it.
pub async fn execute_add(session: &Session, id: &str, url: &str) -> Result<()> {
    let mut registry = session.open_registry()?;

    if !session.quiet() {
        println!("{} Downloading firmware '{id}' from {url}", status::INFO);
    }
    let bar = session.download_bar();
    let callback = bar.as_ref().map(progress_callback);

    let result = registry.create_firmware(id, url, callback.as_ref()).await;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    let created = result.with_context(|| format!("Failed to add firmware '{id}'"))?;

    if !session.quiet() {
        println!(
            "{} Added firmware '{}' at {}",
            status::SUCCESS,
            created.entry.id,
            created.artifact.path.display()
        );
        print_artifact(&created.artifact);
    }
    Ok(())
}

/// Execute the firmware remove command
pub fn execute_remove(session: &Session, id: &str) -> Result<()> {
    let mut registry = session.open_registry()?;
    registry
        .delete_resource(ResourceKind::Firmware, id)
        .with_context(|| format!("Failed to remove firmware '{id}'"))?;

    if !session.quiet() {
        println!("{} Removed firmware '{id}'", status::SUCCESS);
    }
    Ok(())
}
