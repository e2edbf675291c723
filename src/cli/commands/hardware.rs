//! Hardware subcommand implementations
//!
//! Implements `rpem hardware list`, `rpem hardware add` and
//! `rpem hardware remove`.

use anyhow::{Context, Result};

use crate::cli::output::{status, yes_no};
use crate::cli::Session;
use crate::core::model::ResourceKind;

/// Execute the hardware list command
pub fn execute_list(session: &Session) -> Result<()> {
    let registry = session.open_registry()?;
    let hardware = &registry.state().hardware;

    if hardware.is_empty() {
        println!("No hardware profiles registered.");
        return Ok(());
    }

    println!("{:<16} {:<10} {:<8} {:<24} ARGS", "ID", "ARCH", "DEFAULT", "NAME");
    for hw in hardware.values() {
        println!(
            "{:<16} {:<10} {:<8} {:<24} {}",
            hw.id,
            hw.qemu_arch,
            yes_no(hw.is_default),
            hw.name,
            hw.qemu_args
        );
    }

    Ok(())
}

/// Execute the hardware add command
pub fn execute_add(session: &Session, id: &str, name: &str, arch: &str, args: &str) -> Result<()> {
    let mut registry = session.open_registry()?;
    let hardware = registry
        .create_hardware(id, name, arch, args)
        .with_context(|| format!("Failed to add hardware '{id}'"))?;

    if !session.quiet() {
        println!(
            "{} Added hardware '{}' (qemu-system-{})",
            status::SUCCESS,
            hardware.id,
            hardware.qemu_arch
        );
    }
    Ok(())
}

/// Execute the hardware remove command
pub fn execute_remove(session: &Session, id: &str) -> Result<()> {
    let mut registry = session.open_registry()?;
    registry
        .delete_resource(ResourceKind::Hardware, id)
        .with_context(|| format!("Failed to remove hardware '{id}'"))?;

    if !session.quiet() {
        println!("{} Removed hardware '{id}'", status::SUCCESS);
    }
    Ok(())
}
