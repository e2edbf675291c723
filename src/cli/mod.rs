//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::ProgressBar;

use crate::core::global_config::GlobalConfig;
use crate::core::registry::Registry;
use crate::infra::dirs::{DataLayout, RpemDirs};
use crate::infra::fetch::ArtifactFetcher;
use commands::Commands;

/// Version string with the git revision and target of the build
pub fn long_version() -> String {
    format!(
        "{} ({} {})",
        env!("CARGO_PKG_VERSION"),
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown"),
        option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown"),
    )
}

/// rpem - Raspberry Pi emulator manager
///
/// Keeps a local registry of QEMU hardware profiles, operating systems,
/// firmware and disk images, and builds the emulator command line.
#[derive(Parser, Debug)]
#[command(name = "rpem")]
#[command(author, version, about, long_about = None)]
#[command(long_version = long_version())]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Data directory (default: ~/.rpem, or RPEM_DATA_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Default log level for the verbosity flags
    pub fn log_level(&self) -> tracing::Level {
        match (self.quiet, self.verbose) {
            (true, _) => tracing::Level::ERROR,
            (false, 0) => tracing::Level::WARN,
            (false, 1) => tracing::Level::INFO,
            (false, _) => tracing::Level::DEBUG,
        }
    }

    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        if let Some(cmd) = self.command {
            let session = Session::new(self.data_dir, self.quiet)?;
            cmd.run(&session).await
        } else {
            // No subcommand provided, show help
            use clap::CommandFactory;
            let mut cmd = Self::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}

/// Settings shared by every command of one invocation
#[derive(Debug)]
pub struct Session {
    dirs: RpemDirs,
    config: GlobalConfig,
    quiet: bool,
}

impl Session {
    pub fn new(data_dir: Option<PathBuf>, quiet: bool) -> Result<Self> {
        let mut dirs = RpemDirs::new();
        if let Some(data_dir) = data_dir {
            dirs = dirs.with_data_dir(data_dir);
        }
        let config = GlobalConfig::load(&dirs).context("Failed to load global configuration")?;
        Ok(Self {
            dirs,
            config,
            quiet,
        })
    }

    pub fn quiet(&self) -> bool {
        self.quiet
    }

    /// Effective data directory
    pub fn data_dir(&self) -> PathBuf {
        self.config.data_dir(&self.dirs)
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// Open (or seed) the registry of the data directory
    pub fn open_registry(&self) -> Result<Registry> {
        let catalog = self
            .config
            .load_catalog()
            .context("Failed to load default catalog")?;
        let fetcher = ArtifactFetcher::new(self.config.download_manager());
        let data_dir = self.data_dir();
        let registry = Registry::load(DataLayout::new(&data_dir), catalog, fetcher)
            .with_context(|| format!("Failed to open data directory {}", data_dir.display()))?;
        Ok(registry.with_emulator_prefix(self.config.emulator_prefix()))
    }

    /// Download progress bar, unless output is suppressed
    pub fn download_bar(&self) -> Option<ProgressBar> {
        (!self.quiet).then(output::create_download_bar)
    }
}
