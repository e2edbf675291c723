//! rpem CLI - Raspberry Pi emulator manager
//!
//! Entry point for the rpem command-line application.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rpem::cli::output::display_error;
use rpem::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // -v/-vv set the default level; RUST_LOG still wins
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(cli.log_level().into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli.run().await {
        display_error(&e);
        std::process::exit(1);
    }
}
