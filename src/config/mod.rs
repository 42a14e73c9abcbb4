//! Application configuration and constants.
//!
//! This module provides:
//! - Store key layout and timeout constants
//! - Watch backoff parameters
//! - CLI option types and parsing

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{LogFormat, LogLevel, Opt};
