//! Output formatting and progress indicators
//!
//! This module provides utilities for displaying progress bars and
//! formatted messages to the user.

use indicatif::{ProgressBar, ProgressStyle};

use crate::core::status::format_size;
use crate::infra::download::ProgressCallback;
use crate::infra::fetch::FetchOutcome;

/// Create a progress bar for downloads
///
/// The length is filled in once the server reports a content length.
pub fn create_download_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .expect("Invalid progress bar template")
            .progress_chars("█▓▒░"),
    );
    pb
}

/// Feed download progress into `bar`
pub fn progress_callback(bar: &ProgressBar) -> ProgressCallback {
    let bar = bar.clone();
    Box::new(move |downloaded, total| {
        if total > 0 && bar.length() != Some(total) {
            bar.set_length(total);
        }
        bar.set_position(downloaded);
    })
}

/// Print size and digest of a fetched artifact
pub fn print_artifact(outcome: &FetchOutcome) {
    println!("  Size: {}", format_size(outcome.size));
    match &outcome.sha256 {
        Some(digest) => println!("  SHA256 (download): {digest}"),
        None => println!("  Reused the file already on disk"),
    }
}

/// Print an error and its chain of causes to stderr
pub fn display_error(err: &anyhow::Error) {
    eprintln!("{} {err}", status::ERROR);
    for cause in err.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
}

/// Render `yes`/`no` columns
pub fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}
