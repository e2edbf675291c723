//! rpem - Raspberry Pi emulator manager
//!
//! Keeps a local registry of QEMU hardware profiles, operating systems,
//! firmware and disk images, downloads the artifacts they need and renders
//! the emulator command line.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Registry, catalog and command building
//! - [`infra`] - Infrastructure layer (network, filesystem, processes)
//! - [`config`] - Constants and the built-in catalog
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;
