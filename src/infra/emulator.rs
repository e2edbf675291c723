//! Emulator process launching

use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

use crate::core::command::QemuCommand;
use crate::error::EmulatorError;

/// Resolve the emulator binary of a command on PATH
///
/// Programs given as a path are accepted as-is when the file exists.
pub fn locate(cmd: &QemuCommand) -> Result<PathBuf, EmulatorError> {
    let candidate = PathBuf::from(&cmd.program);
    if candidate.components().count() > 1 {
        return if candidate.is_file() {
            Ok(candidate)
        } else {
            Err(EmulatorError::NotFound {
                program: cmd.program.clone(),
            })
        };
    }

    which::which(&cmd.program).map_err(|_| EmulatorError::NotFound {
        program: cmd.program.clone(),
    })
}

/// Run the emulator in the foreground with inherited stdio
///
/// Blocks until QEMU exits and returns its exit status.
pub fn run(cmd: &QemuCommand) -> Result<ExitStatus, EmulatorError> {
    let program = locate(cmd)?;
    let args = cmd.args()?;
    tracing::info!("Starting emulator: {}", cmd);

    let status = Command::new(&program)
        .args(&args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| EmulatorError::Spawn {
            program: cmd.program.clone(),
            error: e.to_string(),
        })?;

    tracing::debug!("Emulator exited with {}", status);
    Ok(status)
}
