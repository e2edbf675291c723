//! HTTP download functionality
//!
//! Streams a URL to a file with optional progress reporting, hashing the
//! bytes as they arrive.

use futures::StreamExt;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::config::defaults;
use crate::error::FetchError;

/// Progress callback type for download progress reporting
///
/// Called with (`bytes_downloaded`, `total_bytes`); `total_bytes` is 0 when
/// the server does not send a content length.
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;

/// Size and digest of a completed transfer
#[derive(Debug)]
pub struct DownloadResult {
    /// Size in bytes
    pub size: u64,
    /// SHA256 checksum of the downloaded content
    pub checksum: String,
}

/// Download manager for fetching files over HTTP
#[derive(Debug, Clone)]
pub struct DownloadManager {
    /// HTTP client
    client: reqwest::Client,
}

impl DownloadManager {
    /// Create a new download manager with default timeouts
    pub fn new() -> Self {
        Self::with_timeouts(
            Duration::from_secs(defaults::DOWNLOAD_TIMEOUT_SECS),
            Duration::from_secs(defaults::CONNECT_TIMEOUT_SECS),
        )
    }

    /// Create a download manager with custom timeouts
    pub fn with_timeouts(timeout: Duration, connect_timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(defaults::USER_AGENT)
                .timeout(timeout)
                .connect_timeout(connect_timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Download `url` into `dest`, truncating anything already there
    ///
    /// A failed transfer removes `dest`; a partial file is never left behind
    /// for a later call to mistake for a complete one.
    pub async fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<&ProgressCallback>,
    ) -> Result<DownloadResult, FetchError> {
        let result = self.download_once(url, dest, progress).await;
        if result.is_err() {
            if let Err(e) = tokio::fs::remove_file(dest).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to remove partial download {}: {}", dest.display(), e);
                }
            }
        }
        result
    }

    async fn download_once(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<&ProgressCallback>,
    ) -> Result<DownloadResult, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network {
                url: url.to_string(),
                error: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(FetchError::Network {
                url: url.to_string(),
                error: format!("HTTP {}", response.status()),
            });
        }

        let total_size = response.content_length().unwrap_or(0);

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FetchError::Io {
                    path: parent.to_path_buf(),
                    error: e.to_string(),
                })?;
        }

        let mut file = File::create(dest).await.map_err(|e| FetchError::Io {
            path: dest.to_path_buf(),
            error: e.to_string(),
        })?;

        let mut hasher = Sha256::new();
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| FetchError::Network {
                url: url.to_string(),
                error: e.to_string(),
            })?;

            file.write_all(&chunk).await.map_err(|e| FetchError::Io {
                path: dest.to_path_buf(),
                error: e.to_string(),
            })?;

            hasher.update(&chunk);
            downloaded += chunk.len() as u64;

            if let Some(cb) = progress {
                cb(downloaded, total_size);
            }
        }

        file.flush().await.map_err(|e| FetchError::Io {
            path: dest.to_path_buf(),
            error: e.to_string(),
        })?;
        file.sync_all().await.map_err(|e| FetchError::Io {
            path: dest.to_path_buf(),
            error: e.to_string(),
        })?;

        let checksum = hex::encode(hasher.finalize());
        tracing::debug!("Downloaded {} bytes from {} (sha256 {})", downloaded, url, checksum);

        Ok(DownloadResult {
            size: downloaded,
            checksum,
        })
    }
}

impl Default for DownloadManager {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_download_success() {
        let mock_server = MockServer::start().await;
        let content = b"hello world";

        Mock::given(method("GET"))
            .and(path("/test.img"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
            .mount(&mock_server)
            .await;

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("sub").join("downloaded.img");
        let manager = DownloadManager::new();

        let result = manager
            .download(&format!("{}/test.img", mock_server.uri()), &dest, None)
            .await
            .unwrap();

        assert_eq!(
            result.checksum,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        assert_eq!(result.size, content.len() as u64);
        assert_eq!(std::fs::read(&dest).unwrap(), content);
    }

    #[tokio::test]
    async fn test_download_reports_progress() {
        let mock_server = MockServer::start().await;
        let content = vec![7u8; 4096];

        Mock::given(method("GET"))
            .and(path("/progress.img"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(content.clone()))
            .mount(&mock_server)
            .await;

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("progress.img");
        let manager = DownloadManager::new();

        let seen = Arc::new(AtomicU64::new(0));
        let seen_clone = seen.clone();
        let progress: ProgressCallback = Box::new(move |downloaded, _total| {
            seen_clone.store(downloaded, Ordering::SeqCst);
        });

        manager
            .download(
                &format!("{}/progress.img", mock_server.uri()),
                &dest,
                Some(&progress),
            )
            .await
            .unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 4096);
    }

    #[tokio::test]
    async fn test_download_http_error_leaves_no_file() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing.img"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("missing.img");
        let manager = DownloadManager::new();

        let result = manager
            .download(&format!("{}/missing.img", mock_server.uri()), &dest, None)
            .await;

        match result {
            Err(FetchError::Network { error, .. }) => assert!(error.contains("404")),
            other => panic!("Expected Network error, got: {other:?}"),
        }
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_download_unreachable_host() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("unreachable.img");
        let manager =
            DownloadManager::with_timeouts(Duration::from_secs(2), Duration::from_secs(1));

        let result = manager
            .download("http://127.0.0.1:1/unreachable.img", &dest, None)
            .await;

        assert!(matches!(result, Err(FetchError::Network { .. })));
        assert!(!dest.exists());
    }
}
