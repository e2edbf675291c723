//! Operating system subcommand implementations

use anyhow::{Context, Result};

use crate::cli::output::status;
use crate::cli::Session;
use crate::core::model::ResourceKind;

/// Arguments of `rpem os add`
#[derive(Debug, Clone)]
pub struct AddOptions {
    pub id: String,
    pub name: String,
    pub details: String,
    pub firmware: String,
    pub hardware: Vec<String>,
    pub url: String,
}

/// Execute the os list command
pub fn execute_list(session: &Session) -> Result<()> {
    let registry = session.open_registry()?;
    let systems = &registry.state().os;

    if systems.is_empty() {
        println!("No operating systems registered.");
        return Ok(());
    }

    for os in systems.values() {
        let default_marker = if os.is_default { " [default]" } else { "" };
        println!("{} - {}{}", os.id, os.name, default_marker);
        if !os.details.is_empty() {
            println!("    Details: {}", os.details);
        }
        let hardware: Vec<&str> = os.hardware_ids.iter().map(|hw| hw.as_str()).collect();
        println!("    Hardware: {}", hardware.join(", "));
        println!("    Firmware: {}", os.firmware_id);
        println!("    URL: {}", os.dl_link);
    }

    println!();
    println!(
        "{} operating system(s), {} user-defined.",
        systems.len(),
        systems.values().filter(|os| !os.is_default).count()
    );

    Ok(())
}

/// Execute the os add command
pub fn execute_add(session: &Session, options: &AddOptions) -> Result<()> {
    let mut registry = session.open_registry()?;
    let hardware: Vec<&str> = options.hardware.iter().map(String::as_str).collect();

    let os = registry
        .create_os(
            &options.id,
            &options.name,
            &options.details,
            &options.firmware,
            &hardware,
            &options.url,
        )
        .with_context(|| format!("Failed to add operating system '{}'", options.id))?;

    if !session.quiet() {
        println!(
            "{} Added operating system '{}' for {} hardware profile(s)",
            status::SUCCESS,
            os.id,
            os.hardware_ids.len()
        );
    }
    Ok(())
}

/// Execute the os remove command
pub fn execute_remove(session: &Session, id: &str) -> Result<()> {
    let mut registry = session.open_registry()?;
    registry
        .delete_resource(ResourceKind::Os, id)
        .with_context(|| format!("Failed to remove operating system '{id}'"))?;

    if !session.quiet() {
        println!("{} Removed operating system '{id}'", status::SUCCESS);
    }
    Ok(())
}
