//! Core business logic module
//!
//! Registry semantics, the default catalog and command building. File and
//! network access go through [`crate::infra`].
//!
//! # Submodules
//!
//! - [`model`] - Typed ids and the four entity records
//! - [`catalog`] - Versioned default dataset
//! - [`state`] - Registry maps, persisted document, defaults merge
//! - [`registry`] - Create, delete and query operations with durable saves
//! - [`command`] - Emulator command construction
//! - [`global_config`] - Global configuration management
//! - [`status`] - Data directory usage

pub mod catalog;
pub mod command;
pub mod global_config;
pub mod model;
pub mod registry;
pub mod state;
pub mod status;
