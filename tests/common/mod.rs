//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Isolated rpem environment
///
/// Data and config directories live in a temporary directory, so tests
/// never touch `~/.rpem`.
pub struct TestEnv {
    pub dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    pub fn config_dir(&self) -> PathBuf {
        self.dir.path().join("config")
    }

    /// Run the rpem binary with `args`
    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_rpem"))
            .args(args)
            .env("RPEM_DATA_DIR", self.data_dir())
            .env("RPEM_CONFIG_DIR", self.config_dir())
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to execute rpem")
    }

    /// Write `config.toml`
    pub fn write_config(&self, content: &str) {
        std::fs::create_dir_all(self.config_dir()).expect("Failed to create config dir");
        std::fs::write(self.config_dir().join("config.toml"), content)
            .expect("Failed to write config");
    }

    pub fn state_file(&self) -> PathBuf {
        self.data_dir().join("index.json")
    }

    /// Parsed state document
    pub fn state(&self) -> serde_json::Value {
        let content = std::fs::read_to_string(self.state_file()).expect("Failed to read state");
        serde_json::from_str(&content).expect("State is not JSON")
    }

    /// Ids of one kind in the state document
    pub fn ids(&self, key: &str) -> Vec<String> {
        self.state()[key]
            .as_array()
            .expect("Missing array in state")
            .iter()
            .filter_map(|entry| entry["id"].as_str().map(ToString::to_string))
            .collect()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Gzip `data` for HTTP fixtures
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(data).expect("gzip write");
    encoder.finish().expect("gzip finish")
}

/// Xz-compress `data` for HTTP fixtures
pub fn xz(data: &[u8]) -> Vec<u8> {
    let mut encoder = xz2::write::XzEncoder::new(Vec::new(), 1);
    encoder.write_all(data).expect("xz write");
    encoder.finish().expect("xz finish")
}

/// Files in `dir` left over by downloads or decompression
pub fn temp_artifacts(dir: &Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|name| {
                [".part", ".gz", ".xz", ".staging", ".tmp"]
                    .iter()
                    .any(|suffix| name.ends_with(suffix))
            })
            .collect(),
        Err(_) => Vec::new(),
    }
}
