//! CLI command for `rpem cmd`
//!
//! Prints the emulator invocation for an image, fetching the firmware on
//! first use.

use anyhow::{Context, Result};

use crate::cli::output::progress_callback;
use crate::cli::Session;
use crate::core::command::QemuCommand;
use crate::core::registry::Registry;

/// Pick the image to use: the argument, or the last image
pub(crate) fn resolve_image(registry: &Registry, image: Option<&str>) -> Result<String> {
    match (image, registry.last_image()) {
        (Some(id), _) => Ok(id.to_string()),
        (None, Some(last)) => Ok(last.to_string()),
        (None, None) => anyhow::bail!(
            "No image given and no image used yet. Create one with 'rpem image create'."
        ),
    }
}

/// Build the command for `image`, showing download progress if needed
pub(crate) async fn build_command(
    session: &Session,
    registry: &Registry,
    image_id: &str,
) -> Result<QemuCommand> {
    let bar = session.download_bar();
    let callback = bar.as_ref().map(progress_callback);

    let result = registry.get_qemu_cmd(image_id, callback.as_ref()).await;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    result.with_context(|| format!("Failed to build emulator command for '{image_id}'"))
}

/// Execute the cmd command
pub async fn execute(session: &Session, image: Option<&str>) -> Result<()> {
    let registry = session.open_registry()?;
    let image_id = resolve_image(&registry, image)?;

    let command = build_command(session, &registry, &image_id).await?;
    println!("{command}");
    Ok(())
}
