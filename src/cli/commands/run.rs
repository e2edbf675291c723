//! CLI command for `rpem run`
//!
//! Starts QEMU in the foreground for an image and exits with its status.

use anyhow::{Context, Result};

use crate::cli::commands::cmd::{build_command, resolve_image};
use crate::cli::output::status;
use crate::cli::Session;
use crate::infra::emulator;

/// Execute the run command
pub async fn execute(session: &Session, image: Option<&str>) -> Result<()> {
    let mut registry = session.open_registry()?;
    let image_id = resolve_image(&registry, image)?;

    let command = build_command(session, &registry, &image_id).await?;
    emulator::locate(&command)?;
    command.args()?;
    registry
        .set_last_image(&image_id)
        .context("Failed to record last image")?;

    if !session.quiet() {
        println!("{} {command}", status::INFO);
    }

    let exit = tokio::task::spawn_blocking(move || emulator::run(&command))
        .await
        .context("Emulator task failed")??;

    if !exit.success() {
        tracing::debug!("Emulator exited with {exit}");
        std::process::exit(exit.code().unwrap_or(1));
    }
    Ok(())
}
