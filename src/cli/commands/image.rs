//! Image subcommand implementations
//!
//! Implements `rpem image list`, `rpem image create`, `rpem image remove`
//! and `rpem image path`.

use anyhow::{Context, Result};

use crate::cli::output::{print_artifact, progress_callback, status};
use crate::cli::Session;
use crate::core::model::ResourceKind;
use crate::core::status::format_size;

/// Execute the image list command
///
/// The last used image is marked with `*`.
pub fn execute_list(session: &Session) -> Result<()> {
    let registry = session.open_registry()?;
    let images = &registry.state().images;

    if images.is_empty() {
        println!("No images yet. Create one with 'rpem image create <name> --hardware <id> --os <id>'.");
        return Ok(());
    }

    println!("  {:<36} {:<20} {:<12} {:<10} NAME", "ID", "OS", "HARDWARE", "SIZE");
    for image in images.values() {
        let marker = if registry.last_image() == Some(&image.id) {
            "*"
        } else {
            " "
        };
        let size = std::fs::metadata(registry.layout().image_path(image.id.as_str()))
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "missing".to_string());
        println!(
            "{marker} {:<36} {:<20} {:<12} {:<10} {}",
            image.id, image.os_id, image.hardware_id, size, image.name
        );
    }

    Ok(())
}

/// Execute the image create command
///
/// Downloads and unpacks the operating system into the new image.
pub async fn execute_create(session: &Session, name: &str, hardware: &str, os: &str) -> Result<()> {
    let mut registry = session.open_registry()?;

    if !session.quiet() {
        println!("{} Creating image '{name}' ({os} on {hardware})", status::INFO);
    }
    let bar = session.download_bar();
    let callback = bar.as_ref().map(progress_callback);

    let result = registry
        .create_image(name, hardware, os, callback.as_ref())
        .await;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    let created = result.with_context(|| format!("Failed to create image '{name}'"))?;

    if !session.quiet() {
        println!("{} Created image '{}'", status::SUCCESS, created.entry.id);
        println!("  Path: {}", created.artifact.path.display());
        print_artifact(&created.artifact);
        println!("  Run it with 'rpem run {}'", created.entry.id);
    }
    Ok(())
}

/// Execute the image remove command
pub fn execute_remove(session: &Session, id: &str) -> Result<()> {
    let mut registry = session.open_registry()?;
    registry
        .delete_resource(ResourceKind::Image, id)
        .with_context(|| format!("Failed to remove image '{id}'"))?;

    if !session.quiet() {
        println!("{} Removed image '{id}' and its disk file", status::SUCCESS);
    }
    Ok(())
}

/// Execute the image path command
pub fn execute_path(session: &Session, id: &str) -> Result<()> {
    let registry = session.open_registry()?;
    if !registry.has_resource(ResourceKind::Image, id) {
        anyhow::bail!("No image found for id '{id}'. Run 'rpem image list' to see images.");
    }

    println!("{}", registry.layout().image_path(id).display());
    Ok(())
}
