//! Configuration and constants
//!
//! Static defaults and the embedded default catalog (`catalog.json`).

pub mod defaults;
