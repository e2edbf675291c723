//! Data directory status
//!
//! Disk usage of the `images/` and `fw/` directories, and artifact files no
//! registry entry accounts for (leftover partial downloads, files of
//! deleted entries copied back by hand).

use std::path::{Path, PathBuf};

use crate::config::defaults;
use crate::core::state::RegistryState;
use crate::infra::dirs::DataLayout;

/// Usage of one artifact directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirUsage {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub file_count: usize,
}

impl DirUsage {
    /// Measure `path` recursively; a missing directory is empty
    pub fn measure(path: &Path) -> Self {
        let (size_bytes, file_count) = walkdir::WalkDir::new(path)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| e.metadata().ok())
            .fold((0, 0), |(size, count), m| (size + m.len(), count + 1));

        Self {
            path: path.to_path_buf(),
            size_bytes,
            file_count,
        }
    }
}

/// Summary of a data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataStatus {
    pub images: DirUsage,
    pub firmware: DirUsage,
    /// Files under `images/` or `fw/` with no matching entry
    pub untracked: Vec<PathBuf>,
}

impl DataStatus {
    pub fn total_bytes(&self) -> u64 {
        self.images.size_bytes + self.firmware.size_bytes
    }
}

/// Collect the status of `layout` against the registry contents
pub fn data_status(layout: &DataLayout, state: &RegistryState) -> DataStatus {
    let mut untracked = untracked_files(&layout.images_dir(), defaults::IMAGE_EXT, |id| {
        state.images.contains_key(id)
    });
    untracked.extend(untracked_files(
        &layout.firmware_dir(),
        defaults::FIRMWARE_EXT,
        |id| state.firmware.contains_key(id),
    ));

    DataStatus {
        images: DirUsage::measure(&layout.images_dir()),
        firmware: DirUsage::measure(&layout.firmware_dir()),
        untracked,
    }
}

fn untracked_files(dir: &Path, ext: &str, known: impl Fn(&str) -> bool) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let path = e.path();
            let tracked = path.extension().is_some_and(|x| x == ext)
                && path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .is_some_and(&known);
            !tracked
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

/// Format size for display
pub fn format_size(size_bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    #[allow(clippy::cast_precision_loss)]
    let scaled = |unit: u64| size_bytes as f64 / unit as f64;

    if size_bytes == 0 {
        "0 bytes".to_string()
    } else if size_bytes < KB {
        format!("{size_bytes} bytes")
    } else if size_bytes < MB {
        format!("{:.1} KB", scaled(KB))
    } else if size_bytes < GB {
        format!("{:.1} MB", scaled(MB))
    } else {
        format!("{:.1} GB", scaled(GB))
    }
}
