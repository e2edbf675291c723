//! Artifact fetching
//!
//! Guarantees that an image or firmware file exists, decompressed, at its
//! canonical path `<target_dir>/<id>.<ext>`. Presence is the cache key: an
//! existing canonical file is returned without touching the network.
//!
//! Nothing is written to the canonical path until the artifact is complete:
//! downloads land in `<canonical>.part` (or `.gz`/`.xz`), decompression in
//! `<canonical>.staging`, and each is renamed into place only on success.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::FetchError;
use crate::infra::decompress::{decompress_file, Compression};
use crate::infra::download::{DownloadManager, ProgressCallback};

/// Outcome of [`ArtifactFetcher::ensure_present`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Canonical local path of the artifact
    pub path: PathBuf,
    /// Whether a transfer happened (false on a cache hit)
    pub downloaded: bool,
    /// Size of the artifact on disk
    pub size: u64,
    /// SHA256 of the transferred bytes, when a transfer happened
    pub sha256: Option<String>,
}

/// Canonical path of an artifact: `<dir>/<id>.<ext>`
pub fn canonical_path(target_dir: &Path, canonical_id: &str, ext: &str) -> PathBuf {
    target_dir.join(format!("{canonical_id}.{ext}"))
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

/// Materializes artifacts from URLs into the data directory
#[derive(Debug, Clone, Default)]
pub struct ArtifactFetcher {
    downloads: DownloadManager,
}

impl ArtifactFetcher {
    pub fn new(downloads: DownloadManager) -> Self {
        Self { downloads }
    }

    /// Make sure `<target_dir>/<canonical_id>.<ext>` exists
    ///
    /// Downloads `source_url` if the canonical file is missing, transparently
    /// decompressing `.gz` and `.xz` sources. Leftover partial files from an
    /// interrupted earlier attempt are discarded, never resumed.
    pub async fn ensure_present(
        &self,
        target_dir: &Path,
        canonical_id: &str,
        ext: &str,
        source_url: &str,
        progress: Option<&ProgressCallback>,
    ) -> Result<FetchOutcome, FetchError> {
        let canonical = canonical_path(target_dir, canonical_id, ext);

        if canonical.is_file() {
            tracing::debug!("Artifact {} already present", canonical.display());
            let size = std::fs::metadata(&canonical)
                .map(|m| m.len())
                .unwrap_or_default();
            return Ok(FetchOutcome {
                path: canonical,
                downloaded: false,
                size,
                sha256: None,
            });
        }

        tokio::fs::create_dir_all(target_dir)
            .await
            .map_err(|e| FetchError::Io {
                path: target_dir.to_path_buf(),
                error: e.to_string(),
            })?;

        let compression = Compression::from_url(source_url);
        let download_path = with_suffix(&canonical, compression.download_suffix());
        let staging_path = with_suffix(&canonical, "staging");
        discard_stale(&download_path).await;
        discard_stale(&staging_path).await;

        tracing::info!(
            "Downloading {} -> {} (compression: {})",
            source_url,
            canonical.display(),
            compression
        );
        let download = self
            .downloads
            .download(source_url, &download_path, progress)
            .await?;

        let size = if compression.is_compressed() {
            let src = download_path.clone();
            let dest = staging_path.clone();
            let decoded =
                tokio::task::spawn_blocking(move || decompress_file(compression, &src, &dest))
                    .await
                    .map_err(|e| FetchError::Io {
                        path: staging_path.clone(),
                        error: format!("decompression task failed: {e}"),
                    })
                    .and_then(|inner| inner);
            discard_stale(&download_path).await;
            if decoded.is_err() {
                discard_stale(&staging_path).await;
            }
            let size = decoded?;
            promote(&staging_path, &canonical).await?;
            size
        } else {
            promote(&download_path, &canonical).await?;
            download.size
        };

        tracing::info!("Artifact ready at {} ({} bytes)", canonical.display(), size);

        Ok(FetchOutcome {
            path: canonical,
            downloaded: true,
            size,
            sha256: Some(download.checksum),
        })
    }
}

/// Remove an untrusted leftover file, if any
async fn discard_stale(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!("Removed stale file {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
    }
}

/// Rename a completed file onto its canonical path
async fn promote(from: &Path, to: &Path) -> Result<(), FetchError> {
    if let Err(e) = tokio::fs::rename(from, to).await {
        discard_stale(from).await;
        return Err(FetchError::Io {
            path: to.to_path_buf(),
            error: e.to_string(),
        });
    }
    Ok(())
}
