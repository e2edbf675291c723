//! Filesystem operations
//!
//! Handles file and directory operations for the data directory.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::FilesystemError;

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Read content from a file
pub fn read_file(path: &Path) -> Result<String, FilesystemError> {
    fs::read_to_string(path).map_err(|e| FilesystemError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Sibling path used while replacing `path`
pub fn replace_temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace `path` with `content` without ever exposing a truncated file
///
/// Writes a sibling temp file, syncs it, then renames it over `path`. A
/// crash leaves either the old or the new content in place.
pub fn write_file_atomic(path: &Path, content: &str) -> Result<(), FilesystemError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let tmp_path = replace_temp_path(path);
    let write_err = |e: std::io::Error| FilesystemError::WriteFile {
        path: tmp_path.clone(),
        error: e.to_string(),
    };

    let written = File::create(&tmp_path).and_then(|mut file| {
        file.write_all(content.as_bytes())?;
        file.sync_all()
    });
    if let Err(e) = written {
        discard_temp(&tmp_path);
        return Err(write_err(e));
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        discard_temp(&tmp_path);
        return Err(FilesystemError::Replace {
            path: path.to_path_buf(),
            error: e.to_string(),
        });
    }

    // Persist the rename itself; not supported on every platform
    if let Some(parent) = path.parent() {
        if let Err(e) = File::open(parent).and_then(|dir| dir.sync_all()) {
            tracing::debug!("Could not sync directory {}: {}", parent.display(), e);
        }
    }

    Ok(())
}

fn discard_temp(tmp_path: &Path) {
    if let Err(e) = remove_file_if_exists(tmp_path) {
        tracing::warn!("Failed to remove temporary file: {e}");
    }
}

/// Remove a file, treating "already gone" as success
///
/// Returns whether a file was removed.
pub fn remove_file_if_exists(path: &Path) -> Result<bool, FilesystemError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(FilesystemError::RemoveFile {
            path: path.to_path_buf(),
            error: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_file_atomic_creates_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("index.json");

        write_file_atomic(&path, "{}").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
        assert!(!replace_temp_path(&path).exists());
    }

    #[test]
    fn test_write_file_atomic_replaces_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.json");
        fs::write(&path, "old content that is longer").unwrap();

        write_file_atomic(&path, "new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    /// Test: a failed replace leaves no temp file behind
    #[test]
    fn test_write_file_atomic_failure_removes_temp() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("occupied"), "x").unwrap();

        let result = write_file_atomic(&path, "{}");

        assert!(matches!(result, Err(FilesystemError::Replace { .. })));
        assert!(!replace_temp_path(&path).exists());
        assert!(path.join("occupied").is_file());
    }

    #[test]
    fn test_replace_temp_path_is_sibling() {
        let path = Path::new("/data/index.json");
        assert_eq!(replace_temp_path(path), PathBuf::from("/data/index.json.tmp"));
    }

    #[test]
    fn test_remove_file_if_exists() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("file");
        fs::write(&path, "x").unwrap();

        assert!(remove_file_if_exists(&path).unwrap());
        assert!(!remove_file_if_exists(&path).unwrap());
    }

    #[test]
    fn test_read_file_missing() {
        let result = read_file(Path::new("/nonexistent/file.txt"));
        assert!(matches!(result, Err(FilesystemError::ReadFile { .. })));
    }
}
