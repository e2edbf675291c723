//! Emulator command construction
//!
//! Renders an image and the entries it references into a QEMU invocation:
//! `<binary> <disk-arg> <hardware-args> <firmware-arg>`. QEMU parses flags
//! in order, so the order here is fixed.

use std::fmt;
use std::path::Path;

use crate::config::defaults;
use crate::core::model::Hardware;
use crate::error::EmulatorError;

/// A ready-to-run emulator invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QemuCommand {
    /// Emulator binary name, e.g. `qemu-system-aarch64`
    pub program: String,
    /// `-drive ...` argument for the image file
    pub disk_arg: String,
    /// Hardware flags, verbatim
    pub hardware_args: String,
    /// `-bios ...` argument for the firmware file
    pub firmware_arg: String,
}

impl QemuCommand {
    /// Argument vector for spawning
    ///
    /// Hardware flags are tokenized with shell quoting rules, so the argv
    /// matches what a shell makes of the printed command. The disk and
    /// firmware arguments keep their paths intact even when they contain
    /// spaces.
    pub fn args(&self) -> Result<Vec<String>, EmulatorError> {
        let hardware =
            shell_words::split(&self.hardware_args).map_err(|e| EmulatorError::InvalidArguments {
                program: self.program.clone(),
                args: self.hardware_args.clone(),
                error: e.to_string(),
            })?;

        let mut args = flag_and_value(&self.disk_arg);
        args.extend(hardware);
        args.extend(flag_and_value(&self.firmware_arg));
        Ok(args)
    }
}

fn flag_and_value(arg: &str) -> Vec<String> {
    match arg.split_once(' ') {
        Some((flag, value)) => vec![flag.to_string(), value.to_string()],
        None => vec![arg.to_string()],
    }
}

impl fmt::Display for QemuCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.program, self.disk_arg)?;
        if !self.hardware_args.trim().is_empty() {
            write!(f, " {}", self.hardware_args)?;
        }
        write!(f, " {}", self.firmware_arg)
    }
}

/// Emulator binary for an architecture, e.g. `qemu-system-aarch64`
pub fn emulator_binary(prefix: Option<&str>, qemu_arch: &str) -> String {
    format!(
        "{}{qemu_arch}",
        prefix.unwrap_or(defaults::DEFAULT_EMULATOR_PREFIX)
    )
}

/// `-drive` argument attaching an image file as the raw `hd0` disk
pub fn disk_arg(image_path: &Path) -> String {
    format!(
        "-drive file={},if=none,id=hd0,media=disk,format=raw",
        image_path.display()
    )
}

/// `-bios` argument for a firmware file
pub fn firmware_arg(firmware_path: &Path) -> String {
    format!("-bios {}", firmware_path.display())
}

/// Build the invocation for an image
///
/// Pure: the caller resolves the image and firmware paths (and makes sure the
/// files exist) beforehand.
pub fn build_qemu_command(
    prefix: Option<&str>,
    hardware: &Hardware,
    image_path: &Path,
    firmware_path: &Path,
) -> QemuCommand {
    QemuCommand {
        program: emulator_binary(prefix, &hardware.qemu_arch),
        disk_arg: disk_arg(image_path),
        hardware_args: hardware.qemu_args.clone(),
        firmware_arg: firmware_arg(firmware_path),
    }
}
