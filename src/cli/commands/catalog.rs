//! CLI command for `rpem catalog`
//!
//! Shows the catalog defaults are seeded from, without touching the data
//! directory.

use anyhow::{Context, Result};

use crate::cli::Session;

/// Execute the catalog command
pub fn execute(session: &Session) -> Result<()> {
    let catalog = session
        .config()
        .load_catalog()
        .context("Failed to load default catalog")?;

    println!("Catalog version {}", catalog.version());
    println!();

    println!("Hardware:");
    for hw in catalog.hardware() {
        println!("  {:<10} {:<24} qemu-system-{} {}", hw.id, hw.name, hw.qemu_arch, hw.qemu_args);
    }

    println!();
    println!("Operating systems:");
    for os in catalog.os() {
        let hardware: Vec<&str> = os.hardware_ids.iter().map(|hw| hw.as_str()).collect();
        println!("  {} - {} {}", os.id, os.name, os.details);
        println!("    Hardware: {}", hardware.join(", "));
        println!("    Firmware: {}", os.firmware_id);
        println!("    URL: {}", os.dl_link);
    }

    println!();
    println!("Firmware:");
    for fw in catalog.firmware() {
        println!("  {:<24} {}", fw.id, fw.dl_link);
    }

    Ok(())
}
