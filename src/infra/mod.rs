//! Infrastructure layer
//!
//! Handles all I/O operations: network, filesystem, and external processes.
//! This module is the only place where side effects occur.

pub mod decompress;
pub mod dirs;
pub mod download;
pub mod emulator;
pub mod fetch;
pub mod filesystem;
