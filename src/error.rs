//! Error types for rpem
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::model::ResourceKind;

/// Artifact fetch errors
///
/// Raised while materializing an image or firmware file on disk. A fetch
/// error always aborts the create operation that triggered it.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Network or transport error
    #[error("Network error downloading '{url}': {error}")]
    Network { url: String, error: String },

    /// IO error
    #[error("IO error for '{path}': {error}")]
    Io { path: PathBuf, error: String },

    /// Compressed artifact is corrupt or truncated
    #[error("Failed to decompress {format} artifact '{path}': {error}")]
    Decompression {
        path: PathBuf,
        format: String,
        error: String,
    },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },

    /// Failed to replace file
    #[error("Failed to replace '{path}': {error}")]
    Replace { path: PathBuf, error: String },

    /// Failed to remove file
    #[error("Failed to remove file '{path}': {error}")]
    RemoveFile { path: PathBuf, error: String },
}

/// Invalid resource identifier
///
/// Ids become file names under the data directory, so they are restricted
/// to a conservative character set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {kind} id '{id}': {reason}")]
pub struct IdError {
    pub kind: ResourceKind,
    pub id: String,
    pub reason: String,
}

/// Default catalog errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Failed to read catalog file
    #[error("Failed to read catalog '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Failed to parse catalog JSON
    #[error("Failed to parse catalog: {0}")]
    Parse(String),

    /// Invalid catalog version
    #[error("Catalog version '{version}' is not valid semver: {error}")]
    InvalidVersion { version: String, error: String },

    /// Catalog entry references an entry the catalog does not ship
    #[error("Catalog {kind} '{id}' references unknown {target_kind} '{target}'")]
    DanglingReference {
        kind: ResourceKind,
        id: String,
        target_kind: ResourceKind,
        target: String,
    },

    /// Catalog entry id is not usable
    #[error("Catalog entry rejected: {0}")]
    InvalidId(#[from] IdError),

    /// Two catalog entries of one kind share an id
    #[error("Catalog contains {kind} '{id}' more than once")]
    DuplicateEntry { kind: ResourceKind, id: String },
}

/// Resource registry errors
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Id already present for this kind
    #[error("{kind} already present for id '{id}'")]
    DuplicateId { kind: ResourceKind, id: String },

    /// Referenced entity does not exist
    #[error("No {kind} found for id '{id}'")]
    UnknownReference { kind: ResourceKind, id: String },

    /// Identical image already exists
    #[error("Identical image '{id}' already exists (name '{name}', os '{os_id}', hardware '{hardware_id}')")]
    DuplicateResource {
        id: String,
        name: String,
        os_id: String,
        hardware_id: String,
    },

    /// Delete attempted on a catalog entry
    #[error("Cannot delete default {kind} '{id}'. Default resources are managed by the catalog")]
    ProtectedResource { kind: ResourceKind, id: String },

    /// Delete attempted on an entry other entries depend on
    #[error("Cannot delete {kind} '{id}': still referenced by {}", dependents.join(", "))]
    ResourceInUse {
        kind: ResourceKind,
        id: String,
        dependents: Vec<String>,
    },

    /// Id is not usable
    #[error(transparent)]
    InvalidId(#[from] IdError),

    /// Persisted state document is unreadable or malformed
    #[error("State file '{path}' is corrupt: {error}")]
    CorruptState { path: PathBuf, error: String },

    /// Default catalog error
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Artifact could not be materialized
    #[error("Failed to fetch {kind} '{id}': {source}")]
    Fetch {
        kind: ResourceKind,
        id: String,
        #[source]
        source: FetchError,
    },

    /// Filesystem error
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),
}

/// Emulator launch errors
#[derive(Error, Debug)]
pub enum EmulatorError {
    /// Emulator binary is not on PATH
    #[error("Emulator '{program}' not found. Install QEMU or set [emulator] prefix in config.toml")]
    NotFound { program: String },

    /// Hardware arguments cannot be tokenized
    #[error("Invalid arguments for '{program}': {error} in '{args}'")]
    InvalidArguments {
        program: String,
        args: String,
        error: String,
    },

    /// Emulator could not be started
    #[error("Failed to start '{program}': {error}")]
    Spawn { program: String, error: String },
}
