//! Application initialization and resource setup.
//!
//! This module provides functions to initialize shared resources:
//! - Logger (plain or JSON)
//! - In-process store seeded from (and kept in sync with) a file

mod logger;
mod seed;

// Re-export public API
pub use logger::init_logger_with;
pub use seed::{load_seed, sync_seed};
